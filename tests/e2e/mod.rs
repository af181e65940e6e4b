// End-to-end tests for the Podcast Studio HTTP API
//
// Each test gets its own output directory and a server on an ephemeral port.
// The TTS provider and ffmpeg are replaced by in-process fakes, so the suite
// needs neither network access nor an ffmpeg binary.

mod helpers;
mod test_episodes;
mod test_health;
