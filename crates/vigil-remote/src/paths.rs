//! Canonical path layout of the remote store.
//!
//! ```text
//! users/{address}                     -> User record
//! messages/{pairKey}/{messageId}      -> Message record
//! alerts/{recipient}/{alertId}        -> Alert record
//! locations/{address}                 -> LiveLocation record (overwritten)
//! guardian_of/{guardian}/{owner}      -> reverse guardian index entry
//! ```
//!
//! Addresses arrive already normalized (see `vigil_shared::Address`), so
//! every segment is a legal store key.

use uuid::Uuid;

use vigil_shared::{Address, PairKey};

pub const USERS_ROOT: &str = "users";
pub const MESSAGES_ROOT: &str = "messages";
pub const ALERTS_ROOT: &str = "alerts";
pub const LOCATIONS_ROOT: &str = "locations";
pub const GUARDIAN_OF_ROOT: &str = "guardian_of";

pub fn user(address: &Address) -> String {
    format!("{USERS_ROOT}/{address}")
}

pub fn conversation(pair: &PairKey) -> String {
    format!("{MESSAGES_ROOT}/{pair}")
}

pub fn message(pair: &PairKey, id: &Uuid) -> String {
    format!("{MESSAGES_ROOT}/{pair}/{id}")
}

pub fn alert_inbox(recipient: &Address) -> String {
    format!("{ALERTS_ROOT}/{recipient}")
}

pub fn alert(recipient: &Address, id: &Uuid) -> String {
    format!("{ALERTS_ROOT}/{recipient}/{id}")
}

pub fn location(address: &Address) -> String {
    format!("{LOCATIONS_ROOT}/{address}")
}

/// Everyone listed under this path has `guardian` in their guardian set.
pub fn guardian_of(guardian: &Address) -> String {
    format!("{GUARDIAN_OF_ROOT}/{guardian}")
}

pub fn guardian_of_entry(guardian: &Address, owner: &Address) -> String {
    format!("{GUARDIAN_OF_ROOT}/{guardian}/{owner}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_store_contract() {
        let ana = Address::parse("Ana@Mail.com").unwrap();
        let bo = Address::parse("bo@mail.com").unwrap();
        let pair = PairKey::new(&ana, &bo);

        assert_eq!(user(&ana), "users/ana@mail_com");
        assert_eq!(conversation(&pair), "messages/ana@mail_com_bo@mail_com");
        assert_eq!(alert_inbox(&bo), "alerts/bo@mail_com");
        assert_eq!(location(&ana), "locations/ana@mail_com");
        assert_eq!(
            guardian_of_entry(&bo, &ana),
            "guardian_of/bo@mail_com/ana@mail_com"
        );
    }
}
