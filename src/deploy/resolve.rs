//! Name-or-id resolution
//!
//! Every command that accepts a resource reference goes through here. The
//! reference is first tried as an id (one request, the common case); only
//! when that fails is the full listing fetched and scanned for an exact,
//! case-sensitive name match. A miss reports the reference as given, never
//! the error from the id lookup.

use crate::api::{CloudApi, Server, WebInstance};
use crate::error::{Result, VstatsError};

/// Resolve a server id or name to the server record
///
/// # Errors
///
/// Returns [`VstatsError::NotFound`] when neither stage matches, or the
/// listing error when the fallback listing itself fails.
pub async fn find_server_by_name_or_id(api: &dyn CloudApi, reference: &str) -> Result<Server> {
    match api.get_server(reference).await {
        Ok(server) => return Ok(server),
        Err(e) => tracing::debug!("server id lookup for '{}' missed: {:#}", reference, e),
    }

    let servers = api.list_servers().await?;
    servers
        .into_iter()
        .find(|s| s.name == reference)
        .ok_or_else(|| {
            VstatsError::NotFound {
                kind: "server",
                reference: reference.to_string(),
            }
            .into()
        })
}

/// Resolve a web instance id or name to the instance record
pub async fn find_web_instance_by_name_or_id(
    api: &dyn CloudApi,
    reference: &str,
) -> Result<WebInstance> {
    match api.get_web_instance(reference).await {
        Ok(instance) => return Ok(instance),
        Err(e) => tracing::debug!("web instance id lookup for '{}' missed: {:#}", reference, e),
    }

    let instances = api.list_web_instances().await?;
    instances
        .into_iter()
        .find(|w| w.name == reference)
        .ok_or_else(|| {
            VstatsError::NotFound {
                kind: "web instance",
                reference: reference.to_string(),
            }
            .into()
        })
}
