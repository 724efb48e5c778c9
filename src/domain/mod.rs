// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe what the system
// works with: sentence pairs and the tokenizer contract.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs and traits
//
// The data pipeline and the use cases depend on these traits,
// never on the concrete tokenizer or corpus format.

// A source/target sentence pair
pub mod translation_pair;

// Core abstractions (traits) that other layers implement
pub mod traits;
