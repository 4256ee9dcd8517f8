//! Proxy list loader for line-oriented `host:port` files

use crate::error::LoadError;
use crate::proxy::models::ProxyAddress;
use std::fs;
use std::io;
use std::path::Path;

/// Proxy parser for reading candidate lists from strings and files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line
    ///
    /// Blank lines and lines without a `:` separator yield `None`.
    pub fn parse_line(line: &str) -> Option<ProxyAddress> {
        line.parse().ok()
    }

    /// Parse proxies from a string (multiple lines), keeping file order
    pub fn parse_string(content: &str) -> Vec<ProxyAddress> {
        content.lines().filter_map(Self::parse_line).collect()
    }

    /// Parse proxies from a file
    ///
    /// A missing file, an unreadable file and a file with no usable lines are
    /// all reported as [`LoadError`]s so the caller can stop before probing.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<ProxyAddress>, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let proxies = Self::parse_string(&content);
        if proxies.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }
        Ok(proxies)
    }
}
