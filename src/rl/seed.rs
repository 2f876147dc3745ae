//! Independent RNG seeds derived from a single run seed

use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Random source that receives its own derived seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStream {
    TrainGame,
    EvalGame,
    Replay,
    Exploration,
}

impl SeedStream {
    fn salt(self) -> u64 {
        match self {
            SeedStream::TrainGame => 0x5851_F42D_4C95_7F2D,
            SeedStream::EvalGame => 0x1405_7B7E_F767_814F,
            SeedStream::Replay => 0xD6E8_FEB8_6659_FD93,
            SeedStream::Exploration => 0xA076_1D64_78BD_642F,
        }
    }
}

/// Seed for `stream`, distinct per stream for the same `seed`
pub fn derive_seed(seed: u64, stream: SeedStream) -> u64 {
    StdRng::seed_from_u64(seed ^ stream.salt()).next_u64()
}
