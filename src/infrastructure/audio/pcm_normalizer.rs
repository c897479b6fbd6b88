use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioNormalizer, NormalizeError};
use crate::domain::{AudioBlob, NormalizedAudio, PcmSpec};

/// Symphonia-backed normalizer. Any supported container/codec comes out as
/// 16-bit little-endian PCM in a WAV envelope at the target spec. Input that
/// already matches the target spec round-trips byte-identically.
pub struct SymphoniaNormalizer;

impl SymphoniaNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SymphoniaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNormalizer for SymphoniaNormalizer {
    fn normalize(
        &self,
        blob: &AudioBlob,
        target: PcmSpec,
    ) -> Result<NormalizedAudio, NormalizeError> {
        let decoded = decode_to_pcm(blob)?;
        let mapped = map_channels(decoded.samples, decoded.channels, target.channels)?;
        let samples = if decoded.sample_rate != target.sample_rate_hz {
            resample(
                &mapped,
                decoded.sample_rate,
                target.sample_rate_hz,
                target.channels,
            )?
        } else {
            mapped
        };

        let wav_bytes = encode_wav(&samples, target)?;
        let audio = NormalizedAudio::new(wav_bytes, target);
        tracing::debug!(
            source_rate = decoded.sample_rate,
            source_channels = decoded.channels,
            duration_seconds = audio.duration_seconds(),
            "Audio normalized to canonical PCM"
        );
        Ok(audio)
    }
}

struct DecodedPcm {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: usize,
}

fn decode_to_pcm(blob: &AudioBlob) -> Result<DecodedPcm, NormalizeError> {
    let cursor = Cursor::new(blob.bytes.clone());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = blob.extension() {
        hint.with_extension(extension);
    }
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| NormalizeError::UnsupportedFormat(format!("probe: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| NormalizeError::UnsupportedFormat("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| NormalizeError::UnsupportedFormat("unknown sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &decoder_opts)
        .map_err(|e| NormalizeError::UnsupportedFormat(format!("codec: {}", e)))?;

    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(NormalizeError::ConversionFailed(format!("packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => {
                return Err(NormalizeError::ConversionFailed(format!("decode: {}", e)));
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }

        let mut sample_buf = SampleBuffer::<i16>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(NormalizeError::ConversionFailed(
            "no audio samples decoded".to_string(),
        ));
    }

    Ok(DecodedPcm {
        samples,
        sample_rate,
        channels,
    })
}

fn map_channels(
    samples: Vec<i16>,
    source_channels: usize,
    target_channels: u16,
) -> Result<Vec<i16>, NormalizeError> {
    let target_channels = target_channels as usize;
    if source_channels == 0 || target_channels == 0 {
        return Err(NormalizeError::ConversionFailed(
            "zero channel count".to_string(),
        ));
    }
    if source_channels == target_channels {
        return Ok(samples);
    }

    if target_channels == 1 {
        let mut mono = Vec::with_capacity(samples.len() / source_channels);
        for frame in samples.chunks_exact(source_channels) {
            let sum: i32 = frame.iter().map(|s| *s as i32).sum();
            mono.push((sum / source_channels as i32) as i16);
        }
        return Ok(mono);
    }

    if source_channels == 1 {
        let mut upmixed = Vec::with_capacity(samples.len() * target_channels);
        for sample in samples {
            upmixed.extend(std::iter::repeat(sample).take(target_channels));
        }
        return Ok(upmixed);
    }

    Err(NormalizeError::ConversionFailed(format!(
        "cannot map {} channels to {}",
        source_channels, target_channels
    )))
}

fn resample(
    samples: &[i16],
    from_rate: u32,
    to_rate: u32,
    channels: u16,
) -> Result<Vec<i16>, NormalizeError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let channels = channels.max(1) as usize;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, channels)
        .map_err(|e| NormalizeError::ConversionFailed(format!("resampler init: {}", e)))?;

    let frames = samples.len() / channels;
    let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, sample) in frame.iter().enumerate() {
            planar[channel].push(*sample as f32 / 32_768.0);
        }
    }

    let expected_len = (frames as f64 * ratio) as usize;
    let mut resampled: Vec<Vec<f32>> =
        vec![Vec::with_capacity(expected_len + chunk_size); channels];

    for start in (0..frames).step_by(chunk_size) {
        let end = (start + chunk_size).min(frames);
        let mut input: Vec<Vec<f32>> = Vec::with_capacity(channels);
        for channel in &planar {
            let mut chunk = channel[start..end].to_vec();
            chunk.resize(chunk_size, 0.0);
            input.push(chunk);
        }

        let processed = resampler
            .process(&input, None)
            .map_err(|e| NormalizeError::ConversionFailed(format!("resample: {}", e)))?;

        for (channel, data) in resampled.iter_mut().zip(processed) {
            channel.extend_from_slice(&data);
        }
    }

    for channel in &mut resampled {
        channel.truncate(expected_len);
    }

    let frames_out = resampled.iter().map(|c| c.len()).min().unwrap_or(0);
    let mut interleaved = Vec::with_capacity(frames_out * channels);
    for frame in 0..frames_out {
        for channel in &resampled {
            interleaved.push(clamp_to_i16(channel[frame]));
        }
    }

    Ok(interleaved)
}

fn clamp_to_i16(sample: f32) -> i16 {
    (sample * 32_768.0).round().clamp(-32_768.0, 32_767.0) as i16
}

fn encode_wav(samples: &[i16], spec: PcmSpec) -> Result<Vec<u8>, NormalizeError> {
    let wav_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate_hz,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, wav_spec)
        .map_err(|e| NormalizeError::ConversionFailed(format!("wav header: {}", e)))?;
    for sample in samples {
        writer
            .write_sample(*sample)
            .map_err(|e| NormalizeError::ConversionFailed(format!("wav body: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| NormalizeError::ConversionFailed(format!("wav finalize: {}", e)))?;

    Ok(cursor.into_inner())
}
