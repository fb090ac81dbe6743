use crate::protocol::InputError;

/// Who is connected and which match they are in. Lives only as long as the
/// controller that owns it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    wallet_address: Option<String>,
    current_match_id: Option<String>,
}

impl Session {
    pub fn connect(&mut self, address: impl Into<String>) {
        self.wallet_address = Some(address.into());
    }

    pub fn is_connected(&self) -> bool {
        self.wallet_address.is_some()
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    pub fn require_address(&self) -> Result<&str, InputError> {
        self.wallet_address()
            .ok_or(InputError::WalletNotConnected)
    }

    pub fn current_match_id(&self) -> Option<&str> {
        self.current_match_id.as_deref()
    }

    pub fn set_match_id(&mut self, match_id: Option<String>) {
        self.current_match_id = match_id;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
