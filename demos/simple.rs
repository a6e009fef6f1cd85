//! Basic binary serialization and deserialization.
//!
//! Run with: cargo run --example simple

use serde::{Deserialize, Serialize};
use serde_lnt::{from_slice, to_vec};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
        },
        User {
            id: 43,
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
        },
    ];

    let bytes = to_vec(&users)?;
    println!("Encoded {} users into {} bytes", users.len(), bytes.len());

    let users_back: Vec<User> = from_slice(&bytes)?;
    assert_eq!(users, users_back);
    println!("✓ Round-trip successful");

    Ok(())
}
