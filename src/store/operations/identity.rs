use crate::store::documents::UserIdentity;
use crate::store::{Store, StoreError};

impl Store {
    /// Returns the persisted pseudo-identity, generating one on first use.
    pub fn get_or_create_user_id(&self) -> Result<String, StoreError> {
        let existing: UserIdentity = self.safe_read();
        if !existing.user_id.is_empty() {
            return Ok(existing.user_id);
        }

        let identity = UserIdentity::generate();
        self.write_or_err(&identity)?;
        tracing::info!(user_id = %identity.user_id, "Generated new user identity");
        Ok(identity.user_id)
    }
}
