//! Bit-exact emulation of the console FPU quirks the physics core depends on.
//!
//! Every length and normalization in the simulation runs through [`sqrt`], which is built on the
//! hardware reciprocal square root estimate (`frsqrte`) refined by a single Newton-Raphson step.
//! The lookup table and rounding order must stay bit-identical to the hardware.

const EXPONENT_SHIFT: u32 = 52;
const MANTISSA_MASK: u64 = 0x000F_FFFF_FFFF_FFFF;
const EXPONENT_MASK: u64 = 0x7FF0_0000_0000_0000;
const SIGN_MASK: u64 = 0x8000_0000_0000_0000;

/// `(base, decrement)` pairs for the reciprocal square root estimate.
/// The first 16 entries cover even exponents, the last 16 odd exponents.
const FRSQRTE_TABLE: [(i64, i64); 32] = [
    (0x1a7_e800, 0x568),
    (0x17c_b800, 0x4f3),
    (0x155_2800, 0x48d),
    (0x130_c000, 0x435),
    (0x10f_2000, 0x3e7),
    (0x0ef_f000, 0x3a2),
    (0x0d2_e000, 0x365),
    (0x0b7_c000, 0x32e),
    (0x09e_5000, 0x2fc),
    (0x086_7000, 0x2d0),
    (0x06f_f000, 0x2a8),
    (0x05a_b800, 0x283),
    (0x046_a000, 0x261),
    (0x033_9800, 0x243),
    (0x021_8800, 0x226),
    (0x010_5800, 0x20b),
    (0x3ff_a000, 0x7a4),
    (0x3c2_9000, 0x700),
    (0x38a_a000, 0x670),
    (0x357_2000, 0x5f2),
    (0x327_9000, 0x584),
    (0x2fb_7000, 0x524),
    (0x2d2_6000, 0x4cc),
    (0x2ac_0000, 0x47e),
    (0x288_1000, 0x43a),
    (0x266_5000, 0x3fa),
    (0x246_8000, 0x3c2),
    (0x228_7000, 0x38e),
    (0x20c_1000, 0x35e),
    (0x1f1_2000, 0x332),
    (0x1d7_9000, 0x30a),
    (0x1bf_4000, 0x2e6),
];

/// Rounds the mantissa of `x` to 25 bits, the precision of the paired-single multiplier input.
#[must_use]
pub const fn force_25bit(x: f64) -> f64 {
    let bits = x.to_bits();
    f64::from_bits((bits & 0xFFFF_FFFF_F800_0000) + (bits & 0x0800_0000))
}

/// `x * y + z` as executed by `fmadds`: one double-precision rounding, then a single-precision one.
#[must_use]
pub fn fma(x: f32, y: f32, z: f32) -> f32 {
    (f64::from(x) * force_25bit(f64::from(y)) + f64::from(z)) as f32
}

/// `x * y - z` as executed by `fmsubs`.
#[must_use]
pub fn fms(x: f32, y: f32, z: f32) -> f32 {
    (f64::from(x) * force_25bit(f64::from(y)) - f64::from(z)) as f32
}

/// Hardware reciprocal square root estimate (`frsqrte`), accurate to roughly 12 bits.
///
/// Special values follow the instruction: `±0` gives `±inf`, `+inf` gives `0`,
/// and NaN or any negative input gives NaN.
#[must_use]
pub fn frsqrte(val: f64) -> f64 {
    let bits = val.to_bits();
    let mut mantissa = bits & MANTISSA_MASK;
    let mut exponent = (bits & EXPONENT_MASK) as i64;
    let sign = bits & SIGN_MASK;

    if bits & !SIGN_MASK == 0 {
        return if sign == 0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }

    if exponent == EXPONENT_MASK as i64 {
        if mantissa == 0 {
            return if sign == 0 { 0.0 } else { f64::NAN };
        }

        return val;
    }

    if sign != 0 {
        return f64::NAN;
    }

    if exponent == 0 {
        // denormal
        loop {
            exponent -= 1 << EXPONENT_SHIFT;
            mantissa <<= 1;
            if mantissa & (1 << EXPONENT_SHIFT) != 0 {
                break;
            }
        }

        mantissa &= MANTISSA_MASK;
        exponent += 1 << EXPONENT_SHIFT;
    }

    let exponent_lsb = exponent & (1 << EXPONENT_SHIFT);
    let exponent = ((0x3FF << EXPONENT_SHIFT) - ((exponent - (0x3FE << EXPONENT_SHIFT)) / 2))
        & (0x7FF << EXPONENT_SHIFT);

    let idx = ((exponent_lsb as u64 | mantissa) >> 37) as i64;
    let (base, dec) = FRSQRTE_TABLE[(idx / 2048) as usize];
    let fraction = (base - dec * (idx % 2048)) << 26;

    f64::from_bits(exponent as u64 | fraction as u64)
}

/// Reciprocal square root: [`frsqrte`] followed by one Newton-Raphson refinement.
#[must_use]
pub fn frsqrt(x: f32) -> f32 {
    let est = frsqrte(f64::from(x));

    let tmp0 = (est * force_25bit(est)) as f32;
    let tmp1 = (est * 0.5) as f32;
    let tmp2 = (3.0 - f64::from(tmp0) * f64::from(x)) as f32;

    tmp1 * tmp2
}

/// Square root as the engine computes it. Non-positive inputs yield zero.
#[must_use]
pub fn sqrt(x: f32) -> f32 {
    if x > 0.0 { frsqrt(x) * x } else { 0.0 }
}
