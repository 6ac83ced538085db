//! Reading the queue settings from the config table.

use tracing::warn;

use crate::domain::{ConfigKey, QueueSettings};
use crate::error::Result;
use crate::ports::ConfigStore;

/// Read the current settings. Called once per decision, never cached.
///
/// A missing or unparsable value falls back to the default for that key so a
/// bad manual edit cannot stop workers from deciding.
pub async fn load_settings<S: ConfigStore + ?Sized>(store: &S) -> Result<QueueSettings> {
    let mut settings = QueueSettings::default();
    for key in ConfigKey::ALL {
        if let Some(raw) = store.get_config(key).await? {
            match key.parse_value(&raw) {
                Ok(value) => settings.set(key, value),
                Err(e) => warn!(
                    key = %key,
                    value = %raw,
                    error = %e,
                    "ignoring invalid config value"
                ),
            }
        }
    }
    Ok(settings)
}
