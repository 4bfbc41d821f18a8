// Inventory endpoints
//
// Collection listing, filtered search, CRUD, and the purchase/restock
// actions. Each write returns the server's resulting item.

use tracing::debug;

use crate::client::InventoryClient;
use crate::error::Error;
use crate::models::{RestockBody, SearchParams, Sweet, SweetPatch, SweetPayload};

impl InventoryClient {
    /// List every item.
    ///
    /// `GET /sweets`
    pub async fn list_sweets(&self) -> Result<Vec<Sweet>, Error> {
        let url = self.api_url("sweets")?;
        let sweets: Vec<Sweet> = self.get(url).await?;
        debug!(count = sweets.len(), "listed sweets");
        Ok(sweets)
    }

    /// Server-side filtered search. Unset filter fields are not sent.
    ///
    /// `GET /sweets/search?name=&category=&min_price=&max_price=`
    pub async fn search_sweets(&self, params: &SearchParams) -> Result<Vec<Sweet>, Error> {
        let url = self.api_url("sweets/search")?;
        let sweets: Vec<Sweet> = self.get_with_query(url, params).await?;
        debug!(count = sweets.len(), "search returned");
        Ok(sweets)
    }

    /// Create an item.
    ///
    /// `POST /sweets`
    pub async fn create_sweet(&self, body: &SweetPayload) -> Result<Sweet, Error> {
        let url = self.api_url("sweets")?;
        self.post(url, body).await
    }

    /// Partially update an item.
    ///
    /// `PUT /sweets/{id}`
    pub async fn update_sweet(&self, id: &str, patch: &SweetPatch) -> Result<Sweet, Error> {
        let url = self.api_url(&format!("sweets/{id}"))?;
        self.put(url, patch).await
    }

    /// Delete an item.
    ///
    /// `DELETE /sweets/{id}`
    pub async fn delete_sweet(&self, id: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("sweets/{id}"))?;
        self.delete(url).await
    }

    /// Buy one unit. The service rejects this when stock is zero.
    ///
    /// `POST /sweets/{id}/purchase`
    pub async fn purchase_sweet(&self, id: &str) -> Result<Sweet, Error> {
        let url = self.api_url(&format!("sweets/{id}/purchase"))?;
        self.post_empty(url).await
    }

    /// Add `quantity` units to stock.
    ///
    /// `POST /sweets/{id}/restock`
    pub async fn restock_sweet(&self, id: &str, quantity: u32) -> Result<Sweet, Error> {
        let url = self.api_url(&format!("sweets/{id}/restock"))?;
        self.post(url, &RestockBody { quantity }).await
    }
}
