use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{debug, info};

use crate::config::db::{ConnectionDescriptor, DbKind, LogicalDatabaseName};
use crate::error::DbInfraError;

/// A descriptor resolved into a driver URL and engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub kind: DbKind,
}

fn connection_error(message: impl Into<String>) -> DbInfraError {
    DbInfraError::Connection {
        message: message.into(),
    }
}

/// Validate the descriptor URL, strip a `jdbc:` prefix and inject separately
/// supplied credentials into server URLs that carry none.
pub fn resolve_url(descriptor: &ConnectionDescriptor) -> Result<ResolvedUrl, DbInfraError> {
    let raw = descriptor.url.trim();
    let url = raw.strip_prefix("jdbc:").unwrap_or(raw);
    if url.is_empty() {
        return Err(connection_error("database URL is empty"));
    }

    if let Some(rest) = url.strip_prefix("sqlite:") {
        let kind = if rest == ":memory:" || rest.contains("mode=memory") {
            DbKind::SqliteMemory
        } else {
            DbKind::SqliteFile
        };
        let path = rest.trim_start_matches("//");
        if kind == DbKind::SqliteFile && path.split('?').next().unwrap_or("").is_empty() {
            return Err(connection_error("sqlite URL has no database path"));
        }
        return Ok(ResolvedUrl {
            url: url.to_string(),
            kind,
        });
    }

    let (scheme, rest) = ["postgresql://", "postgres://"]
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme).map(|rest| (*scheme, rest)))
        .ok_or_else(|| {
            connection_error(format!(
                "unsupported database URL scheme: {}",
                sanitize_db_url(url)
            ))
        })?;

    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host.is_empty() || host.starts_with(':') {
        return Err(connection_error(format!(
            "database URL has no host: {}",
            sanitize_db_url(url)
        )));
    }

    let has_credentials = authority.contains('@');
    let url = match (&descriptor.username, has_credentials) {
        (Some(username), false) => {
            let user = utf8_percent_encode(username, NON_ALPHANUMERIC);
            match &descriptor.password {
                Some(password) => {
                    let password = utf8_percent_encode(password, NON_ALPHANUMERIC);
                    format!("{scheme}{user}:{password}@{authority}{tail}")
                }
                None => format!("{scheme}{user}@{authority}{tail}"),
            }
        }
        _ => url.to_string(),
    };

    Ok(ResolvedUrl {
        url,
        kind: DbKind::Postgres,
    })
}

/// Sanitize database URL by masking password in connection strings.
/// Used for logging.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((userinfo, host)) => match userinfo.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}{tail}"),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}

/// Build the query handle for one logical database.
///
/// Server pools are lazy, so an unreachable server is not an error here.
/// In-memory SQLite is pinned to one connection: each connection would
/// otherwise see its own empty database.
pub async fn connect(
    name: LogicalDatabaseName,
    descriptor: &ConnectionDescriptor,
) -> Result<(DatabaseConnection, DbKind), DbInfraError> {
    let resolved = resolve_url(descriptor)?;

    let mut opt = ConnectOptions::new(resolved.url.clone());
    match resolved.kind {
        DbKind::SqliteMemory => {
            opt.min_connections(1).max_connections(1);
        }
        DbKind::SqliteFile | DbKind::Postgres => {
            opt.min_connections(descriptor.pool.min_connections)
                .max_connections(descriptor.pool.max_connections)
                .connect_lazy(true);
        }
    }
    opt.acquire_timeout(descriptor.pool.acquire_timeout)
        .connect_timeout(descriptor.pool.acquire_timeout.max(Duration::from_secs(1)))
        .sqlx_logging(false);

    debug!(
        database = %name,
        engine = resolved.kind.engine(),
        min = descriptor.pool.min_connections,
        max = descriptor.pool.max_connections,
        "building connection pool"
    );

    let conn = Database::connect(opt).await.map_err(|e| {
        connection_error(format!(
            "failed to build pool for {}: {e}",
            sanitize_db_url(&resolved.url)
        ))
    })?;

    info!(
        "connection=ready database={} engine={} url={}",
        name,
        resolved.kind.engine(),
        sanitize_db_url(&resolved.url)
    );

    Ok((conn, resolved.kind))
}
