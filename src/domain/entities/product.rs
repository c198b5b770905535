/// Product metadata returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub product_id: String,
    pub title: String,
    pub description: String,
    /// Price formatted for the storefront's locale.
    pub localized_price: String,
}
