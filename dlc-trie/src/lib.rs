//! # Dlc-trie
//! Package for decomposing numerical outcome ranges into digit prefixes and
//! storing the resulting prefixes in a trie.

#![crate_name = "dlc_trie"]
// Coding conventions
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(missing_docs)]

extern crate dlc;
#[cfg(feature = "use-serde")]
extern crate serde;

#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod digit_decomposition;
pub mod digit_trie;

/// Structure containing a reference to a looked-up value and the
/// path at which it was found.
#[derive(Debug, PartialEq, Eq)]
pub struct LookupResult<'a, T> {
    /// The path at which the `value` was found.
    pub path: Vec<usize>,
    /// The value that was returned.
    pub value: &'a T,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
/// Structure that stores the indexes at which the CET and adaptor signature
/// related to a given outcome are located in CET and adaptor signatures arrays
/// respectively.
pub struct RangeInfo {
    /// a cet index
    pub cet_index: usize,
    /// an adaptor signature index
    pub adaptor_index: usize,
}

/// An error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value is already stored at the given path, at one of its prefixes or
    /// under it.
    Conflict(Vec<usize>),
    /// The path contains a digit that is not valid for the base of the trie.
    InvalidPath,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Conflict(path) => write!(f, "Conflicting value for path {:?}", path),
            Error::InvalidPath => write!(f, "Invalid path"),
        }
    }
}

impl std::error::Error for Error {}
