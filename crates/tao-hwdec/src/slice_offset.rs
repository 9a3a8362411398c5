//! H.264 切片第一个宏块的位偏移.
//!
//! `slice_data_bit_offset` 由上层按去除防竞争字节 (`00 00 03`) 后的码流计算,
//! 硬件需要的是原始码流中的偏移, 因此需要统计切片头内的防竞争字节.

use crate::params::{AvcSliceParams, EntropyCodingMode};

fn align_for_entropy(bit_offset: u32, entropy: EntropyCodingMode) -> u32 {
    match entropy {
        // CABAC 数据从字节边界开始
        EntropyCodingMode::Cabac => bit_offset.next_multiple_of(8),
        EntropyCodingMode::Cavlc => bit_offset,
    }
}

/// 第一个宏块的位偏移, 不统计防竞争字节
pub fn first_mb_bit_offset(slice: &AvcSliceParams, entropy: EntropyCodingMode) -> u32 {
    align_for_entropy(u32::from(slice.slice_data_bit_offset), entropy)
}

/// 第一个宏块的位偏移, 计入切片头内的防竞争字节
///
/// `data` 为整个切片数据缓冲, 切片从 `slice_data_offset` 开始.
pub fn first_mb_bit_offset_with_epb(
    data: &[u8],
    slice: &AvcSliceParams,
    entropy: EntropyCodingMode,
) -> u32 {
    let bit_offset = u32::from(slice.slice_data_bit_offset);
    let header_size = (bit_offset / 8) as usize;
    let data_size = slice.slice_data_size.saturating_sub(slice.slice_data_offset) as usize;
    // 防竞争字节最多让切片头膨胀到 1.5 倍
    let window = ((header_size * 3 + 1) / 2).min(data_size);

    let start = (slice.slice_data_offset as usize).min(data.len());
    let end = start.saturating_add(window).min(data.len());
    let buf = &data[start..end];

    let mut epb_count = 0u32;
    let (mut i, mut j) = (2usize, 2usize);
    while i < buf.len() && j < header_size {
        if buf[i] == 0x03 && buf[i - 1] == 0x00 && buf[i - 2] == 0x00 {
            i += 2;
            j += 1;
            epb_count += 1;
        }
        i += 1;
        j += 1;
    }

    align_for_entropy(bit_offset + epb_count * 8, entropy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(bit_offset: u16, size: u32) -> AvcSliceParams {
        AvcSliceParams {
            slice_data_offset: 0,
            slice_data_size: size,
            slice_data_bit_offset: bit_offset,
            ..Default::default()
        }
    }

    #[test]
    fn test_cabac_alignment() {
        let s = slice(13, 64);
        assert_eq!(first_mb_bit_offset(&s, EntropyCodingMode::Cavlc), 13);
        assert_eq!(first_mb_bit_offset(&s, EntropyCodingMode::Cabac), 16);
    }

    #[test]
    fn test_counts_emulation_prevention_in_header() {
        // 切片头 6 字节, 其中包含一个 00 00 03
        let data = [0x25, 0x00, 0x00, 0x03, 0x01, 0x88, 0x84, 0x00, 0x00, 0x03];
        let s = slice(6 * 8 + 3, data.len() as u32);
        assert_eq!(
            first_mb_bit_offset_with_epb(&data, &s, EntropyCodingMode::Cavlc),
            6 * 8 + 3 + 8
        );
        assert_eq!(
            first_mb_bit_offset_with_epb(&data, &s, EntropyCodingMode::Cabac),
            64
        );
    }

    #[test]
    fn test_epb_after_header_ignored() {
        let data = [0x25, 0x11, 0x22, 0x00, 0x00, 0x03, 0x01];
        let s = slice(3 * 8, data.len() as u32);
        assert_eq!(
            first_mb_bit_offset_with_epb(&data, &s, EntropyCodingMode::Cavlc),
            24
        );
    }

    #[test]
    fn test_short_buffer_is_clamped() {
        let data = [0x00, 0x00];
        let s = slice(10 * 8, 100);
        assert_eq!(
            first_mb_bit_offset_with_epb(&data, &s, EntropyCodingMode::Cavlc),
            80
        );
    }
}
