use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlob {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl AudioBlob {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn format(&self) -> Option<AudioFormat> {
        AudioFormat::from_filename(&self.filename)
    }

    pub fn extension(&self) -> Option<&str> {
        let (stem, extension) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension)
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    M4a,
    Aac,
    Ogg,
    Opus,
}

impl AudioFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            "m4a" => Some(Self::M4a),
            "aac" => Some(Self::Aac),
            "ogg" => Some(Self::Ogg),
            "opus" => Some(Self::Opus),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        let (stem, extension) = filename.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::from_extension(extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::Aac => "aac",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmSpec {
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl PcmSpec {
    pub const fn new(sample_rate_hz: u32, channels: u16) -> Self {
        Self {
            sample_rate_hz,
            channels,
        }
    }
}

const WAV_HEADER_BYTES: usize = 44;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAudio {
    wav_bytes: Vec<u8>,
    spec: PcmSpec,
}

impl NormalizedAudio {
    pub fn new(wav_bytes: Vec<u8>, spec: PcmSpec) -> Self {
        Self { wav_bytes, spec }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.wav_bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.wav_bytes
    }

    pub fn spec(&self) -> PcmSpec {
        self.spec
    }

    pub fn duration_seconds(&self) -> f64 {
        let data_bytes = self.wav_bytes.len().saturating_sub(WAV_HEADER_BYTES);
        let bytes_per_second = self.spec.sample_rate_hz as usize * self.spec.channels as usize * 2;
        if bytes_per_second == 0 {
            return 0.0;
        }
        data_bytes as f64 / bytes_per_second as f64
    }
}
