//! Static packing → packer table.

use eepack_core::{Packer, Packing};

use crate::packer::{EeP256Packer, EeP521Packer};

static EE_P256: EeP256Packer = EeP256Packer::new();
static EE_P521: EeP521Packer = EeP521Packer::new();

/// The packer implementing `packing`.
pub fn lookup(packing: Packing) -> &'static dyn Packer {
    match packing {
        Packing::EeP256 => &EE_P256,
        Packing::EeP521 => &EE_P521,
    }
}
