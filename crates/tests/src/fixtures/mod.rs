pub mod fake_platform;
pub mod test_engine;

/// A minimal two-cue WebVTT document for caption-path tests.
pub fn sample_vtt() -> String {
    "WEBVTT\nKind: captions\nLanguage: en\n\n\
     00:00:00.000 --> 00:00:02.500\nhello from captions\n\n\
     00:00:02.500 --> 00:00:05.000\nsecond caption cue\n"
        .to_string()
}
