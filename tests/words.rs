use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use phonodrill::words::generate::{
    build_prompt, load_words, parse_word_list, strip_code_fences, BuiltinWords, FileWords,
    GenerationClient, WordRequest, WordSource,
};
use phonodrill::words::{self, Level};

const BAT_JSON: &str = r#"[
    {
        "text": "Bat",
        "phonetic": "bæt",
        "whatsUp": "b [😀+🤒] t",
        "intonation": "━ (BAT) ━",
        "vowels": [
            {"ipa": "æ", "f1": 750, "f2": 1850, "widthF1": 280, "widthF2": 550}
        ]
    }
]"#;

/// One-shot HTTP stub: reads the full request, answers with the canned
/// status and body, then closes.
fn spawn_stub(status: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let endpoint = format!("http://{}/generate", listener.local_addr().unwrap());
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept stub connection");
        read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes());
    });
    endpoint
}

fn read_request(stream: &mut impl Read) {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(read) => read,
        };
        raw.extend_from_slice(&chunk[..read]);
        let Some(header_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&raw[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if raw.len() >= header_end + 4 + content_length {
            return;
        }
    }
}

fn nested_payload(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
    .to_string()
}

#[test]
fn code_fences_are_stripped() {
    let fenced = format!("```json\n{BAT_JSON}\n```");
    assert_eq!(strip_code_fences(&fenced), BAT_JSON.trim());
    let words = parse_word_list(&fenced).unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].text, "Bat");
    assert_eq!(words[0].vowels[0].ipa, "æ");
    assert_eq!(words[0].vowels[0].width_f2, Some(550.0));
}

#[test]
fn prompt_carries_level_phonemes_and_difficulty() {
    let basic = build_prompt(Level::B1, &[]);
    assert!(basic.contains("CEFR Level B1"));
    assert!(basic.contains("diverse set of words"));

    let filtered = build_prompt(Level::C1, &["æ".to_string(), "ɪ".to_string()]);
    assert!(filtered.contains("CEFR Level C1"));
    assert!(filtered.contains("æ, ɪ"));
    assert!(filtered.contains("STRICTLY ADVANCED VOCABULARY"));
}

#[test]
fn server_error_falls_back_to_builtin_words() {
    let endpoint = spawn_stub("500 Internal Server Error", String::new());
    let client = GenerationClient::new(endpoint).unwrap();
    let request = WordRequest::new(Level::A1, Vec::new());
    assert!(client.fetch(&request).is_err());

    let endpoint = spawn_stub("500 Internal Server Error", String::new());
    let client = GenerationClient::new(endpoint).unwrap();
    let loaded = load_words(&client, &request);
    assert!(!loaded.is_empty());
    assert_eq!(loaded, words::fallback_words());
}

#[test]
fn successful_generation_parses_the_nested_payload() {
    let body = nested_payload(&format!("```json\n{BAT_JSON}\n```"));
    let endpoint = spawn_stub("200 OK", body);
    let client = GenerationClient::new(endpoint).unwrap();
    let loaded = load_words(&client, &WordRequest::new(Level::B2, Vec::new()));
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "Bat");
}

#[test]
fn empty_generation_result_falls_back() {
    let body = nested_payload("[]");
    let endpoint = spawn_stub("200 OK", body);
    let client = GenerationClient::new(endpoint).unwrap();
    let loaded = load_words(&client, &WordRequest::new(Level::A2, Vec::new()));
    assert_eq!(loaded, words::fallback_words());
}

#[test]
fn file_source_reads_and_survives_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.json");
    std::fs::write(&path, BAT_JSON).unwrap();
    let request = WordRequest::new(Level::A1, Vec::new());

    let source = FileWords::new(path);
    let loaded = load_words(&source, &request);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "Bat");

    let missing = FileWords::new(dir.path().join("absent.json"));
    assert_eq!(load_words(&missing, &request), words::fallback_words());
}

#[test]
fn builtin_source_serves_the_fallback_list() {
    let request = WordRequest::new(Level::C2, Vec::new());
    let loaded = load_words(&BuiltinWords, &request);
    assert_eq!(loaded.len(), 3);
    assert!(loaded.iter().all(|word| word.primary_vowel().is_some()));
}

#[test]
fn inventory_separates_monophthongs_from_diphthongs() {
    let total = words::american_vowels().len();
    let pure = words::monophthongs().count();
    assert_eq!(total, 21);
    assert_eq!(pure, 16);
    assert!(words::vowel("aɪ").unwrap().is_diphthong());
    assert!(!words::vowel("æ").unwrap().is_diphthong());
}
