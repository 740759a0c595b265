/// x^8 + x^4 + x^3 + x^2 + 1, the binary8 prime polynomial.
pub const POLY: u16 = 0x11D;

/// 2 generates the multiplicative group of GF(2^8) mod 0x11D.
pub const GENERATOR: u8 = 0x02;

pub struct GfTables {
    pub exp: [u8; 512], // doubled so log(a) + log(b) never needs a modulo
    pub log: [u8; 256],
}

const fn gen_tables() -> GfTables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x = 1u16;
    let mut i = 0;

    // log[0] is undefined; callers test for zero first.
    while i < 255 {
        exp[i] = x as u8;
        exp[i + 255] = x as u8;
        log[x as usize] = i as u8;

        x <<= 1;
        if x & 0x100 != 0 {
            x ^= POLY;
        }
        i += 1;
    }

    exp[510] = exp[0];
    exp[511] = exp[1];

    GfTables { exp, log }
}

/// Built at compile time, lives in .rodata.
pub static TABLES: GfTables = gen_tables();
