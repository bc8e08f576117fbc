//! Audio ingest validation and shaping.
//!
//! Pure functions over 16-bit little-endian PCM byte buffers. None of them
//! keep state, so they are safe to call concurrently from every session. A
//! trailing odd byte, if any, is ignored by the shaping functions.

/// Largest accepted audio frame
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;
/// Sample rate expected by the STT provider
pub const TARGET_SAMPLE_RATE: u32 = 16_000;
/// Default noise gate threshold
pub const DEFAULT_NOISE_GATE_THRESHOLD: i16 = 500;
/// Default normalization peak
pub const DEFAULT_TARGET_PEAK: i16 = 0x6000;
/// Peaks below this are left alone by [`normalize`]
pub const NORMALIZE_FLOOR: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

/// Format forwarded to the STT provider
pub const TARGET_FORMAT: AudioFormat = AudioFormat {
    sample_rate: TARGET_SAMPLE_RATE,
    channels: 1,
    bit_depth: 16,
};

/// Why a frame was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRejection {
    Empty,
    OddLength(usize),
    TooLarge(usize),
}

/// Check a frame, reporting the first failing rule
pub fn check(buffer: &[u8]) -> Result<(), FrameRejection> {
    if buffer.is_empty() {
        return Err(FrameRejection::Empty);
    }
    if buffer.len() % 2 != 0 {
        return Err(FrameRejection::OddLength(buffer.len()));
    }
    if buffer.len() > MAX_FRAME_BYTES {
        return Err(FrameRejection::TooLarge(buffer.len()));
    }
    Ok(())
}

/// `true` when the frame is non-empty, holds whole 16-bit samples and is at
/// most [`MAX_FRAME_BYTES`] long
pub fn validate(buffer: &[u8]) -> bool {
    check(buffer).is_ok()
}

fn samples(buffer: &[u8]) -> impl Iterator<Item = i16> + '_ {
    buffer
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
}

fn to_bytes(samples: impl Iterator<Item = i16>) -> Vec<u8> {
    samples.flat_map(|s| s.to_le_bytes()).collect()
}

/// Nearest-neighbour resampling by index scaling.
///
/// Identity when the rates match. Otherwise the output holds
/// `floor(input_samples / (source_rate / target_rate))` samples, each taken
/// from `floor(i * ratio)`.
pub fn resample(buffer: &[u8], source_rate: u32, target_rate: u32) -> Vec<u8> {
    if source_rate == target_rate || source_rate == 0 || target_rate == 0 {
        return buffer.to_vec();
    }

    let input: Vec<i16> = samples(buffer).collect();
    let ratio = f64::from(source_rate) / f64::from(target_rate);
    let output_len = (input.len() as f64 / ratio).floor() as usize;

    to_bytes((0..output_len).filter_map(|i| {
        let index = (i as f64 * ratio).floor() as usize;
        input.get(index).copied()
    }))
}

/// [`resample`] to [`TARGET_SAMPLE_RATE`]
pub fn resample_to_target(buffer: &[u8], source_rate: u32) -> Vec<u8> {
    resample(buffer, source_rate, TARGET_SAMPLE_RATE)
}

/// Average interleaved left/right samples, truncating toward zero
pub fn stereo_to_mono(buffer: &[u8]) -> Vec<u8> {
    to_bytes(buffer.chunks_exact(4).map(|frame| {
        let left = i32::from(i16::from_le_bytes([frame[0], frame[1]]));
        let right = i32::from(i16::from_le_bytes([frame[2], frame[3]]));
        // Rust integer division truncates toward zero
        ((left + right) / 2) as i16
    }))
}

/// Zero every sample whose magnitude is below `threshold`
pub fn noise_gate(buffer: &[u8], threshold: i16) -> Vec<u8> {
    let threshold = i32::from(threshold);
    to_bytes(samples(buffer).map(|s| {
        if i32::from(s).abs() < threshold {
            0
        } else {
            s
        }
    }))
}

/// Scale so the absolute peak becomes `target_peak`.
///
/// Buffers whose peak is below [`NORMALIZE_FLOOR`] are returned unchanged so
/// near-silence is never amplified. Results are rounded and clamped to the
/// 16-bit range.
pub fn normalize(buffer: &[u8], target_peak: i16) -> Vec<u8> {
    let peak = samples(buffer)
        .map(|s| i32::from(s).abs())
        .max()
        .unwrap_or(0);

    if peak < NORMALIZE_FLOOR {
        return buffer.to_vec();
    }

    let gain = f64::from(target_peak) / f64::from(peak);
    to_bytes(samples(buffer).map(|s| {
        // halves round up (-2.5 => -2)
        let scaled = (f64::from(s) * gain + 0.5).floor();
        scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }))
}

/// Duration of a mono 16-bit buffer in milliseconds
pub fn duration_ms(buffer: &[u8], sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    let sample_count = (buffer.len() / 2) as f64;
    sample_count / f64::from(sample_rate) * 1000.0
}

/// Accumulates small chunks until a duration threshold is reached
#[derive(Debug)]
pub struct AudioChunkBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
    flush_threshold_bytes: usize,
}

impl AudioChunkBuffer {
    /// Buffer flushing once `max_buffer_ms` of mono 16-bit audio is held
    pub fn new(max_buffer_ms: u32, sample_rate: u32) -> Self {
        let flush_threshold_bytes =
            (u64::from(max_buffer_ms) * u64::from(sample_rate) * 2 / 1000) as usize;
        Self {
            chunks: Vec::new(),
            total_bytes: 0,
            flush_threshold_bytes,
        }
    }

    pub fn add(&mut self, chunk: Vec<u8>) {
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn should_flush(&self) -> bool {
        self.total_bytes >= self.flush_threshold_bytes
    }

    /// Take everything buffered so far, or `None` when empty
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.chunks.is_empty() {
            return None;
        }
        let combined = self.chunks.concat();
        self.clear();
        Some(combined)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.total_bytes == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn decode(buffer: &[u8]) -> Vec<i16> {
        samples(buffer).collect()
    }

    #[test]
    fn test_validate_rejects_empty_buffer() {
        // テスト項目: 0 バイトのバッファは拒否される
        assert!(!validate(&[]));
        assert_eq!(check(&[]), Err(FrameRejection::Empty));
    }

    #[test]
    fn test_validate_rejects_odd_length_buffer() {
        // テスト項目: 奇数長（3 バイト）のバッファは拒否される
        assert!(!validate(&[1, 2, 3]));
        assert_eq!(check(&[1, 2, 3]), Err(FrameRejection::OddLength(3)));
    }

    #[test]
    fn test_validate_rejects_oversized_buffer() {
        // テスト項目: 1 MiB を超えるバッファは拒否される
        // given (前提条件):
        let buffer = vec![0u8; MAX_FRAME_BYTES + 2];

        // when (操作):
        let result = validate(&buffer);

        // then (期待する結果):
        assert!(!result);
        assert_eq!(
            check(&buffer),
            Err(FrameRejection::TooLarge(MAX_FRAME_BYTES + 2))
        );
    }

    #[test]
    fn test_validate_accepts_regular_frames() {
        // テスト項目: 4096 バイトおよび 1 MiB ちょうどのバッファは受け付けられる
        assert!(validate(&vec![0u8; 4096]));
        assert!(validate(&vec![0u8; MAX_FRAME_BYTES]));
    }

    #[test]
    fn test_resample_identity_when_rates_match() {
        // テスト項目: 同じサンプルレートではバイト列がそのまま返される
        // given (前提条件):
        let buffer = pcm(&[1, -2, 3, -4, 32767, -32768]);

        // when (操作):
        let result = resample(&buffer, 16_000, 16_000);

        // then (期待する結果):
        assert_eq!(result, buffer);
    }

    #[test]
    fn test_resample_downsamples_by_index_scaling() {
        // テスト項目: 48kHz → 16kHz で 3 サンプルごとに 1 サンプルが選ばれる
        // given (前提条件):
        let buffer = pcm(&[10, 11, 12, 20, 21, 22, 30, 31]);

        // when (操作):
        let result = resample(&buffer, 48_000, 16_000);

        // then (期待する結果): floor(8 / 3) = 2 サンプル
        assert_eq!(decode(&result), vec![10, 20]);
    }

    #[test]
    fn test_resample_upsamples_by_repeating_samples() {
        // テスト項目: 8kHz → 16kHz で各サンプルが繰り返される
        // given (前提条件):
        let buffer = pcm(&[1, 2, 3]);

        // when (操作):
        let result = resample_to_target(&buffer, 8_000);

        // then (期待する結果):
        assert_eq!(decode(&result), vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_stereo_to_mono_truncates_toward_zero() {
        // テスト項目: 左右の平均は 0 方向へ切り捨てられる
        // given (前提条件):
        let buffer = pcm(&[3, 4, -3, -4, 32767, 32767, -32768, -32767]);

        // when (操作):
        let result = stereo_to_mono(&buffer);

        // then (期待する結果):
        assert_eq!(decode(&result), vec![3, -3, 32767, -32767]);
    }

    #[test]
    fn test_noise_gate_zeroes_quiet_samples() {
        // テスト項目: 閾値未満のサンプルは 0 になり、閾値以上はそのまま
        // given (前提条件):
        let buffer = pcm(&[499, -499, 500, -500, 1200, i16::MIN]);

        // when (操作):
        let result = noise_gate(&buffer, DEFAULT_NOISE_GATE_THRESHOLD);

        // then (期待する結果):
        assert_eq!(decode(&result), vec![0, 0, 500, -500, 1200, i16::MIN]);
    }

    #[test]
    fn test_normalize_leaves_quiet_buffer_unchanged() {
        // テスト項目: ピークが 500 のバッファは変更されない（1000 未満）
        // given (前提条件):
        let buffer = pcm(&[100, -500, 250]);

        // when (操作):
        let result = normalize(&buffer, DEFAULT_TARGET_PEAK);

        // then (期待する結果):
        assert_eq!(result, buffer);
    }

    #[test]
    fn test_normalize_scales_to_target_peak() {
        // テスト項目: ピークが目標値になるようスケーリングされる
        // given (前提条件):
        let buffer = pcm(&[2000, -4000, 1000]);

        // when (操作):
        let result = normalize(&buffer, 8000);

        // then (期待する結果):
        assert_eq!(decode(&result), vec![4000, -8000, 2000]);
    }

    #[test]
    fn test_normalize_rounds_halves_up() {
        // テスト項目: ちょうど 0.5 の端数は正負どちらも大きい方に丸められる
        // given (前提条件):
        let buffer = pcm(&[2000, -5, 5]);

        // when (操作):
        let result = normalize(&buffer, 1000);

        // then (期待する結果):
        assert_eq!(decode(&result), vec![1000, -2, 3]);
    }

    #[test]
    fn test_normalize_clamps_to_sample_range() {
        // テスト項目: i16::MIN を含むバッファでも範囲内にクランプされる
        // given (前提条件):
        let buffer = pcm(&[i16::MIN, 16384]);

        // when (操作):
        let result = normalize(&buffer, i16::MAX);

        // then (期待する結果):
        let decoded = decode(&result);
        assert_eq!(decoded[0], -32767);
        assert_eq!(decoded[1], 16384);
    }

    #[test]
    fn test_duration_ms() {
        // テスト項目: 16kHz で 3200 バイトは 100ms
        assert_eq!(duration_ms(&vec![0u8; 3200], 16_000), 100.0);
        assert_eq!(duration_ms(&[0, 0], 0), 0.0);
    }

    #[test]
    fn test_chunk_buffer_flushes_after_threshold() {
        // テスト項目: 閾値に達するとフラッシュ可能になり、フラッシュで空になる
        // given (前提条件):
        let mut buffer = AudioChunkBuffer::new(100, 16_000);
        buffer.add(vec![1u8; 1600]);
        assert!(!buffer.should_flush());

        // when (操作):
        buffer.add(vec![2u8; 1600]);

        // then (期待する結果):
        assert!(buffer.should_flush());
        let combined = buffer.flush().unwrap();
        assert_eq!(combined.len(), 3200);
        assert_eq!(combined[0], 1);
        assert_eq!(combined[3199], 2);
        assert!(buffer.is_empty());
        assert!(buffer.flush().is_none());
    }
}
