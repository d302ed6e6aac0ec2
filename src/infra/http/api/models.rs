//! Conversions between wire types and application types.

use vitrine_api_types::{CreateProductRequest, ProductResponse, UpdateProductRequest};

use crate::application::products::{CreateProductCommand, UpdateProductCommand};
use crate::domain::entities::ProductRecord;

pub fn product_to_api(record: ProductRecord) -> ProductResponse {
    ProductResponse {
        id: record.id,
        name: record.name,
        description: record.description,
        price: record.price.as_decimal(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

impl From<CreateProductRequest> for CreateProductCommand {
    fn from(request: CreateProductRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
        }
    }
}

impl From<UpdateProductRequest> for UpdateProductCommand {
    fn from(request: UpdateProductRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::Price;

    #[test]
    fn prices_leave_the_api_as_decimals() {
        let record = ProductRecord {
            id: 3,
            name: "Pen".to_string(),
            description: "Blue ink".to_string(),
            price: Price::from_cents(150).unwrap(),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-02 0:00 UTC),
        };

        let response = product_to_api(record);
        assert_eq!(response.id, 3);
        assert_eq!(response.price, 1.5);
        assert_eq!(response.updated_at, datetime!(2024-01-02 0:00 UTC));
    }
}
