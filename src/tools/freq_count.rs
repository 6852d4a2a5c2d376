use rayon::prelude::*;

use crate::huffman_coding::huffman::ALPHABET;

/// Returns a frequency count of the input data. Uses parallelism when data set is over 64k.
pub fn freqs(data: &[u8]) -> [u64; ALPHABET] {
    if data.len() > 64_000 {
        // 16k is pretty much the sweet spot for chunk size.
        data.par_chunks(16_000)
            .fold(
                || [0_u64; ALPHABET],
                |mut freqs, chunk| {
                    chunk.iter().for_each(|&el| freqs[el as usize] += 1);
                    freqs
                },
            )
            .reduce(
                || [0_u64; ALPHABET],
                |mut s, f| {
                    s.iter_mut().zip(f.iter()).for_each(|(a, b)| *a += b);
                    s
                },
            )
    } else {
        let mut freqs = [0_u64; ALPHABET];
        data.iter().for_each(|&el| freqs[el as usize] += 1);
        freqs
    }
}

#[cfg(test)]
mod test {
    use super::freqs;

    #[test]
    fn small_test() {
        let f = freqs(b"abracadabra");
        assert_eq!(f[b'a' as usize], 5);
        assert_eq!(f[b'b' as usize], 2);
        assert_eq!(f[b'r' as usize], 2);
        assert_eq!(f[b'c' as usize], 1);
        assert_eq!(f[b'd' as usize], 1);
        assert_eq!(f.iter().sum::<u64>(), 11);
    }

    #[test]
    fn parallel_test() {
        let data: Vec<u8> = (0..100_000_u32).map(|i| (i % 256) as u8).collect();
        let f = freqs(&data);
        assert_eq!(f.iter().sum::<u64>(), 100_000);
        // 100_000 = 390 * 256 + 160
        assert_eq!(f[0], 391);
        assert_eq!(f[159], 391);
        assert_eq!(f[160], 390);
        assert_eq!(f[255], 390);
    }
}
