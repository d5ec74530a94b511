use crate::api::rest::RestClient;
use crate::error::SeedError;
use crate::types::LookupTable;
use tracing::{info, warn};

pub async fn check_connection(client: &RestClient) -> Result<(), SeedError> {
    client.ping().await?;
    info!(url = %client.base_url(), "REST API reachable");
    Ok(())
}

/// Read one row from each table and return those that answered 200.
pub async fn available_tables(client: &RestClient, tables: &[LookupTable]) -> Vec<LookupTable> {
    let mut available = Vec::with_capacity(tables.len());
    for &table in tables {
        match client.check_table(table.as_str()).await {
            Ok(()) => {
                info!(%table, "table available");
                available.push(table);
            }
            Err(e) => warn!(%table, status = ?e.status(), error = %e, "table unavailable"),
        }
    }
    available
}
