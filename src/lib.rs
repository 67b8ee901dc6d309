pub mod arena;
pub mod config;
pub mod encoder;
pub mod error;
pub mod ligation;
pub mod nucleotide;
pub mod primer;
pub mod satisfiability;
pub mod strand;
pub mod test_tube;

pub use dnalab_protocol as protocol;

pub fn version_cli_text() -> String {
    format!(
        "dnalab {}\nSimulated DNA computing lab",
        env!("CARGO_PKG_VERSION")
    )
}
