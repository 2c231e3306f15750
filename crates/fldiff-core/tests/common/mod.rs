use fldiff_core::core_types::Document;
use serde::Deserialize;

/// Parse a single YAML document
#[allow(dead_code)]
pub fn yaml(text: &str) -> Document {
    serde_yaml::from_str(text).unwrap()
}

/// Parse a `---` separated YAML stream
#[allow(dead_code)]
pub fn stream(text: &str) -> Vec<Document> {
    serde_yaml::Deserializer::from_str(text)
        .map(|doc| Document::deserialize(doc).unwrap())
        .collect()
}

/// A run output resembling what the simulation writes for one test
#[allow(dead_code)]
pub const RUN_OUTPUT: &str = r#"
Version Number: 1.7.6
Root process Hostname: node01
Energies:
  Ekin: 12.534928
  Eh: 25.001337
  EXC: -4.1145
Orbitals:
  - {e: -0.6634, f: 2.0}
  - {e: -0.2765, f: 2.0}
XC: PBE
Timings for root process:
  CPU time (s): 3.21
  Elapsed time (s): 3.5
Memory Consumption Report:
  Remaining Memory (B): 0
"#;
