// Format conversion for CPAL audio streams
//
// The bus renders mono f32; the device may want f32, i16 or u16 with any
// channel count. Conversion goes through cpal's `FromSample<f32>` and is
// allocation-free, suitable for the audio callback.

use cpal::{FromSample, Sample};

/// Write one mono sample to every channel of an interleaved frame
///
/// # Arguments
/// * `internal_sample` - The mono f32 sample to write
/// * `output_frame` - A slice representing one audio frame (e.g., [L, R] for stereo)
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}

/// Fill a whole device buffer with the format's equilibrium value
#[inline]
pub fn write_silence<T>(output: &mut [T])
where
    T: Sample,
{
    output.fill(T::EQUILIBRIUM);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mono_to_interleaved_f32() {
        let mut output: [f32; 2] = [0.0; 2];
        write_mono_to_interleaved_frame(0.5, &mut output);
        assert_eq!(output, [0.5, 0.5]);
    }

    #[test]
    fn test_write_mono_to_interleaved_i16() {
        let mut output: [i16; 4] = [0; 4];
        write_mono_to_interleaved_frame(-0.5, &mut output);
        assert!(output[0] < 0);
        assert!(output.iter().all(|&s| s == output[0]));
    }

    #[test]
    fn test_write_mono_to_interleaved_u16() {
        let mut output: [u16; 1] = [0; 1];
        write_mono_to_interleaved_frame(0.0, &mut output);
        // u16 is offset binary: silence sits mid-range
        assert!((output[0] as i32 - 32768).abs() <= 1);
    }

    #[test]
    fn test_write_silence() {
        let mut output: [u16; 3] = [0; 3];
        write_silence(&mut output);
        assert!(output.iter().all(|&s| s == u16::EQUILIBRIUM));

        let mut output: [f32; 3] = [1.0; 3];
        write_silence(&mut output);
        assert_eq!(output, [0.0; 3]);
    }
}
