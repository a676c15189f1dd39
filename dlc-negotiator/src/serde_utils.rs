use bitcoin::address::NetworkUnchecked;
use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::Address;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize_hex<S>(hex: &[u8], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if s.is_human_readable() {
        s.serialize_str(&hex.to_lower_hex_string())
    } else {
        s.serialize_bytes(hex)
    }
}

pub fn deserialize_hex_array<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
where
    D: Deserializer<'de>,
{
    if deserializer.is_human_readable() {
        let string = String::deserialize(deserializer)?;
        <[u8; 32]>::from_hex(&string).map_err(serde::de::Error::custom)
    } else {
        <[u8; 32]>::deserialize(deserializer)
    }
}

pub fn deserialize_hex_string<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    if deserializer.is_human_readable() {
        let string = String::deserialize(deserializer)?;
        Vec::<u8>::from_hex(&string).map_err(serde::de::Error::custom)
    } else {
        Vec::<u8>::deserialize(deserializer)
    }
}

pub fn serialize_address<S>(address: &Option<Address>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match address {
        Some(a) => s.serialize_some(&a.to_string()),
        None => s.serialize_none(),
    }
}

// Addresses are only stored for our own inputs, so they are trusted to match
// the network in use.
pub fn deserialize_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let string: Option<String> = Option::deserialize(deserializer)?;
    string
        .map(|s| {
            s.parse::<Address<NetworkUnchecked>>()
                .map(|a| a.assume_checked())
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}
