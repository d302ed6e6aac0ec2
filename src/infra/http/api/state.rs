use std::sync::Arc;

use crate::application::products::ProductService;

#[derive(Clone)]
pub struct ApiState {
    pub products: Arc<ProductService>,
}

impl ApiState {
    pub fn new(products: ProductService) -> Self {
        Self {
            products: Arc::new(products),
        }
    }
}
