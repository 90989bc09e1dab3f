use std::{io::ErrorKind, path::PathBuf};

use tokio::fs;

use super::Gateway;
use crate::GatewayError;

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a `.tmp` sibling first and are renamed into place, so a crash
/// mid-write leaves the previous value intact.
#[derive(Clone, Debug)]
pub struct JsonFileGateway {
    dir: PathBuf,
}

impl JsonFileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, GatewayError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(GatewayError::Unavailable(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Gateway for JsonFileGateway {
    async fn load(&self, key: &str) -> Result<Option<String>, GatewayError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), GatewayError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).await?;
        match fs::rename(&tmp, &path).await {
            Ok(()) => Ok(()),
            Err(_) => {
                fs::copy(&tmp, &path).await?;
                let _ = fs::remove_file(&tmp).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let gateway = JsonFileGateway::new("data");
        assert!(gateway.path_for("../etc/passwd").is_err());
        assert!(gateway.path_for("").is_err());
        assert_eq!(
            gateway.path_for("themeMode").unwrap(),
            PathBuf::from("data").join("themeMode.json")
        );
    }
}
