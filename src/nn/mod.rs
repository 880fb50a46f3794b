//! Neural building blocks: dense stacks, the message-passing embedding
//! network and the pairwise antisymmetrizer.

pub mod anti;
pub mod layers;
pub mod schnet;

pub use anti::{LaughlinAnsatz, PAIR_FEATURE_DIM};
pub use layers::{sigmoid, ssp, Activation, Linear, LogDnn, ParamReader, Parameterized};
pub use schnet::{ElectronicSchnet, Interaction, OrbitalHead, PairFeatures};
