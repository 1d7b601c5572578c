// Identity: node public keys

mod keys;

pub use keys::{KeyError, KeyPair, PubKey, PUBKEY_LEN};
