//! Rabbit (RFC 4503). 128-bit key, 64-bit nonce, 16-byte blocks.

use shroud_core::{CryptoError, Result, StreamCipher};
use zeroize::Zeroize;

/// RFC 4503 2.5: counter increment constants.
const A: [u32; 8] = [
    0x4D34D34D, 0xD34D34D3, 0x34D34D34, 0x4D34D34D, 0xD34D34D3, 0x34D34D34, 0x4D34D34D,
    0xD34D34D3,
];

#[derive(Clone)]
struct State {
    x: [u32; 8],
    c: [u32; 8],
    carry: u8,
}

impl State {
    /// RFC 4503 2.3: key setup.
    fn setup_key(key: &[u8; 16]) -> Self {
        let mut k = [0u16; 8];
        for i in 0..8 {
            k[i] = u16::from_le_bytes(key[2 * i..2 * i + 2].try_into().unwrap());
        }
        let mut x = [0u32; 8];
        let mut c = [0u32; 8];
        for j in 0..8 {
            if j % 2 == 0 {
                x[j] = (u32::from(k[(j + 1) % 8]) << 16) | u32::from(k[j]);
                c[j] = (u32::from(k[(j + 4) % 8]) << 16) | u32::from(k[(j + 5) % 8]);
            } else {
                x[j] = (u32::from(k[(j + 5) % 8]) << 16) | u32::from(k[(j + 4) % 8]);
                c[j] = (u32::from(k[j]) << 16) | u32::from(k[(j + 1) % 8]);
            }
        }
        let mut state = State { x, c, carry: 0 };
        for _ in 0..4 {
            state.next_state();
        }
        for j in 0..8 {
            state.c[j] ^= state.x[(j + 4) % 8];
        }
        state
    }

    /// RFC 4503 2.4: IV setup.
    fn setup_iv(&mut self, iv: &[u8; 8]) {
        let i0 = u32::from_le_bytes(iv[0..4].try_into().unwrap());
        let i2 = u32::from_le_bytes(iv[4..8].try_into().unwrap());
        let i1 = (i0 >> 16) | (i2 & 0xFFFF_0000);
        let i3 = (i2 << 16) | (i0 & 0x0000_FFFF);
        let ivs = [i0, i1, i2, i3];
        for j in 0..8 {
            self.c[j] ^= ivs[j % 4];
        }
        for _ in 0..4 {
            self.next_state();
        }
    }

    /// RFC 4503 2.5–2.6: counter system and next-state function.
    fn next_state(&mut self) {
        for j in 0..8 {
            let t = u64::from(self.c[j]) + u64::from(A[j]) + u64::from(self.carry);
            self.carry = ((t >> 32) & 1) as u8;
            self.c[j] = t as u32;
        }
        let mut g = [0u32; 8];
        for j in 0..8 {
            let uv = u64::from(self.x[j].wrapping_add(self.c[j]));
            let square = uv * uv;
            g[j] = (square ^ (square >> 32)) as u32;
        }
        let x = &mut self.x;
        x[0] = g[0]
            .wrapping_add(g[7].rotate_left(16))
            .wrapping_add(g[6].rotate_left(16));
        x[1] = g[1].wrapping_add(g[0].rotate_left(8)).wrapping_add(g[7]);
        x[2] = g[2]
            .wrapping_add(g[1].rotate_left(16))
            .wrapping_add(g[0].rotate_left(16));
        x[3] = g[3].wrapping_add(g[2].rotate_left(8)).wrapping_add(g[1]);
        x[4] = g[4]
            .wrapping_add(g[3].rotate_left(16))
            .wrapping_add(g[2].rotate_left(16));
        x[5] = g[5].wrapping_add(g[4].rotate_left(8)).wrapping_add(g[3]);
        x[6] = g[6]
            .wrapping_add(g[5].rotate_left(16))
            .wrapping_add(g[4].rotate_left(16));
        x[7] = g[7].wrapping_add(g[6].rotate_left(8)).wrapping_add(g[5]);
    }

    /// RFC 4503 2.7: extraction scheme.
    fn extract(&self) -> [u8; 16] {
        let x = &self.x;
        let mut t = [0u16; 8];
        t[0] = (x[0] ^ (x[5] >> 16)) as u16;
        t[1] = ((x[0] >> 16) ^ x[3]) as u16;
        t[2] = (x[2] ^ (x[7] >> 16)) as u16;
        t[3] = ((x[2] >> 16) ^ x[5]) as u16;
        t[4] = (x[4] ^ (x[1] >> 16)) as u16;
        t[5] = ((x[4] >> 16) ^ x[7]) as u16;
        t[6] = (x[6] ^ (x[3] >> 16)) as u16;
        t[7] = ((x[6] >> 16) ^ x[1]) as u16;
        let mut s = [0u8; 16];
        for i in 0..8 {
            s[2 * i..2 * i + 2].copy_from_slice(&t[i].to_le_bytes());
        }
        s
    }
}

impl Drop for State {
    fn drop(&mut self) {
        self.x.zeroize();
        self.c.zeroize();
        self.carry.zeroize();
    }
}

/// Rabbit keystream generator.
pub struct Rabbit {
    state: State,
    initial: State,
    block: [u8; 16],
    offset: usize,
}

impl Rabbit {
    /// 16-byte key and 8-byte nonce.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        if key.len() != 16 {
            return Err(CryptoError::InvalidKeySize);
        }
        if iv.len() != 8 {
            return Err(CryptoError::InvalidIvSize);
        }
        let mut state = State::setup_key(key.try_into().unwrap());
        state.setup_iv(iv.try_into().unwrap());
        let initial = state.clone();
        Ok(Rabbit {
            state,
            initial,
            block: [0; 16],
            offset: 16,
        })
    }
}

impl StreamCipher for Rabbit {
    fn name(&self) -> &'static str {
        "Rabbit"
    }

    fn stride(&self) -> usize {
        16
    }

    fn apply_keystream(&mut self, data: &mut [u8]) {
        for b in data.iter_mut() {
            if self.offset == 16 {
                self.state.next_state();
                self.block = self.state.extract();
                self.offset = 0;
            }
            *b ^= self.block[self.offset];
            self.offset += 1;
        }
    }

    fn reset(&mut self) {
        self.state = self.initial.clone();
        self.offset = 16;
        self.block.zeroize();
    }
}

impl Drop for Rabbit {
    fn drop(&mut self) {
        self.block.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // RFC 4503 appendix A.1, without IV setup.
    #[test]
    fn rfc4503_key_only_first_block() {
        let key = [0u8; 16];
        let state = State::setup_key(&key);
        let mut s = state;
        s.next_state();
        assert_eq!(
            s.extract(),
            hex!("02f74a1c26456bf5ecd6a536f05457b1")
        );
    }

    #[test]
    fn keyed_with_nonce() {
        let mut cipher = Rabbit::new(&[0x42; 16], &[0x24; 8]).unwrap();
        let mut buf = hex!("000102030405060708090A0B0C0D0E0F");
        cipher.apply_keystream(&mut buf);
        assert_eq!(buf, hex!("10298496ceda18ee0e257cbb1ab43bcc"));
    }

    #[test]
    fn chunked_equals_one_shot() {
        let mut a = Rabbit::new(&[5; 16], &[6; 8]).unwrap();
        let mut one = [0u8; 53];
        a.apply_keystream(&mut one);
        let mut b = Rabbit::new(&[5; 16], &[6; 8]).unwrap();
        let mut chunked = [0u8; 53];
        for c in chunked.chunks_mut(5) {
            b.apply_keystream(c);
        }
        assert_eq!(one, chunked);
    }

    #[test]
    fn reset_restores_position() {
        let mut c = Rabbit::new(&[8; 16], &[9; 8]).unwrap();
        let mut a = [0u8; 31];
        c.apply_keystream(&mut a);
        c.reset();
        let mut b = [0u8; 31];
        c.apply_keystream(&mut b);
        assert_eq!(a, b);
    }
}
