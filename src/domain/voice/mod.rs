use crate::domain::script::Speaker;
use std::collections::HashMap;

/// Provider-specific voice identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("no voice configured for speaker '{0}'")]
pub struct UnknownSpeakerError(pub Speaker);

/// Speaker to voice table for one TTS provider
#[derive(Debug, Clone, Default)]
pub struct VoiceMap {
    voices: HashMap<Speaker, VoiceId>,
}

impl VoiceMap {
    /// Blank voice ids are treated as not configured
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Speaker, S)>,
        S: Into<String>,
    {
        let voices = entries
            .into_iter()
            .map(|(speaker, id)| (speaker, id.into().trim().to_string()))
            .filter(|(_, id)| !id.is_empty())
            .map(|(speaker, id)| (speaker, VoiceId(id)))
            .collect();
        Self { voices }
    }

    pub fn lookup(&self, speaker: Speaker) -> Result<&VoiceId, UnknownSpeakerError> {
        self.voices
            .get(&speaker)
            .ok_or(UnknownSpeakerError(speaker))
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
