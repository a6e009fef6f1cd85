//! Base layers and metadata through the container API.
//!
//! A `Circle` stores the fields of its `Shape` base under the reserved
//! `super` key. The unit the radius is written in comes from metadata.
//!
//! Run with: cargo run --example layered

use serde_lnt::{
    decode_with_options, encode_with_options, BinaryOptions, Decode, Encode, Result,
    ValueDecoder, ValueEncoder,
};
use std::error::Error;

#[derive(Debug, PartialEq)]
struct Shape {
    name: String,
    layer: u8,
}

#[derive(Debug, PartialEq)]
struct Circle {
    shape: Shape,
    radius: f64,
}

impl Encode for Shape {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        let mut keyed = encoder.keyed();
        keyed.encode("name", &self.name)?;
        keyed.encode("layer", &self.layer)
    }
}

impl<'de> Decode<'de> for Shape {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        let keyed = decoder.keyed()?;
        Ok(Shape {
            name: keyed.decode("name")?,
            layer: keyed.decode("layer")?,
        })
    }
}

fn scale(metadata: &serde_lnt::Metadata) -> f64 {
    metadata.get::<f64>("millimetres_per_unit").copied().unwrap_or(1.0)
}

impl Encode for Circle {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        let mut keyed = encoder.keyed();
        let radius = self.radius / scale(keyed.metadata());
        keyed.encode("radius", &radius)?;
        keyed.base_layer().encode_with(&self.shape)
    }
}

impl<'de> Decode<'de> for Circle {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        let keyed = decoder.keyed()?;
        let radius: f64 = keyed.decode("radius")?;
        Ok(Circle {
            shape: keyed.base_layer()?.decode_with()?,
            radius: radius * scale(keyed.metadata()),
        })
    }
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let circle = Circle {
        shape: Shape {
            name: "wheel".to_string(),
            layer: 2,
        },
        radius: 250.0,
    };

    let options = BinaryOptions::new().with_metadata("millimetres_per_unit", 10.0f64);
    let bytes = encode_with_options(&circle, &options)?;
    println!("Encoded circle into {} bytes", bytes.len());

    let value: serde_lnt::Value = serde_lnt::from_slice(&bytes)?;
    println!("Stored as: {}", value);

    let back: Circle = decode_with_options(&bytes, &options)?;
    assert_eq!(back, circle);
    println!("✓ Round-trip successful");

    Ok(())
}
