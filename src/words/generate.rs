//! Word-list acquisition. A prompt describing the level and any phoneme
//! constraints goes to a relay endpoint that fronts a text-generation API;
//! the reply nests a JSON array of practice words inside the generation
//! payload. Every failure path degrades to the bundled fallback list so a
//! session is never left without content.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::words::{fallback_words, Level, PracticeWord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const EMOJI_RULES: &str = r#"
CONVERSION TABLE (IPA -> EMOJIS):
1. /ʃ/ =shh
2. /ʒ/ =zhh
3. /tʃ/ =ch
4. /dʒ/ =y
5. /ɑː/ =😲
6. /ɑ̃/ =😲
7. /ʊ/ =😘
8. /ər/ =🤯
9. /j/ =😬
10. /ɪ/ =😑
11. /ə/ =😑
12. /ɔː/ =😑
13. /ʌ/ =😑
14. /ɛ/ =😑
15. /ɜ/ =😚
16. /ɝ/ =😚
17. /w/ =😚
18. /a/ =😍
19. /o/ =😗
20. /uː/ =uu
21. /u/ =u
22. /e/ =e
23. /iː/ =ii
24. /i/ =i
25. /ӕ/ =[😀+🤒]
26. /θ/ =😜
27. /ð/ =😜
28. /m/ =m
29. /p/ =p
30. /b/ =b
31. /t/ =t
32. /d/ =d
33. /f/ =f
34. /v/ =v
35. /k/ =k
36. /g/ =g
37. /s/ =s
38. /z/ =z
39. /h/ =h
40. /r/ =r
41. /l/ =l
42. /ŋ/ =ng
43. /n̩/ =n
44. /aɪ/ =[😍😑]
45. /aʊ/ =[😍😘]
46. /eɪ/ =[😄😑]
47. /ɔɪ/ =[😑😑]
48. /oʊ/ =[😗😘]
49. /ɔ/ =😑
50. /ˈ/ = ˈ
51. /ˌ/ = ˌ
52. /ɹ/ =r
"#;

const INTONATION_RULES: &str = r#"
Intonation: MANDATORY: You MUST use the arrow ⬆️ for the peak/stress syllable.
Authorized symbols ONLY: ━ (low) and ⬆️ (high/stress).
Example: ━ ⬆️(BOUT) ━
NEVER use dashes like '-' or '—' for the stress.
"#;

/// Parameters of one word-list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRequest {
    pub level: Level,
    pub phonemes: Vec<String>,
}

impl WordRequest {
    pub fn new(level: Level, phonemes: Vec<String>) -> Self {
        Self { level, phonemes }
    }
}

/// Supplier of practice words. Implementations may hit the network, read a
/// file, or return bundled content; callers route every outcome through
/// [`load_words`].
pub trait WordSource: Send + Sync {
    fn fetch(&self, request: &WordRequest) -> Result<Vec<PracticeWord>>;
}

/// Resolves a request against a source, substituting the fallback list for
/// any failure or empty result. Never errors: a session always has words.
pub fn load_words(source: &dyn WordSource, request: &WordRequest) -> Vec<PracticeWord> {
    match source.fetch(request) {
        Ok(words) if !words.is_empty() => {
            debug!(count = words.len(), level = %request.level, "word list loaded");
            words
        }
        Ok(_) => {
            warn!(level = %request.level, "word source returned no words, using fallback list");
            fallback_words()
        }
        Err(error) => {
            warn!(error = %error, level = %request.level, "word fetch failed, using fallback list");
            fallback_words()
        }
    }
}

/// Builds the generation prompt: level, difficulty clause, phoneme
/// constraints, and the exact output-format rules.
pub fn build_prompt(level: Level, phonemes: &[String]) -> String {
    let difficulty = if level.is_advanced() {
        "STRICTLY ADVANCED VOCABULARY. Do NOT use common words like 'about', 'water', 'time'. \
         Use academic, scientific, or literary words (e.g., 'Epistemology', 'Ubiquitous', 'Cacophony')."
    } else {
        "Use standard vocabulary suitable for the level."
    };
    let phoneme_clause = if phonemes.is_empty() {
        "Generate a diverse set of words.".to_string()
    } else {
        format!(
            "IMPORTANT: Every word MUST contain at least one of these IPA sounds: [{}].",
            phonemes.join(", ")
        )
    };
    format!(
        "Generate exactly 10 American English practice words for CEFR Level {level}.\n\
         {difficulty}\n\
         {phoneme_clause}\n\n\
         For each word, provide:\n\
         1. \"text\": English spelling.\n\
         2. \"phonetic\": Standard IPA.\n\
         3. \"whatsUp\": Emoji-phonetic representation using these EXACT rules: {EMOJI_RULES}\n\
         4. \"intonation\": Intonation pattern using: {INTONATION_RULES}\n\
         5. \"vowels\": Formant data for primary vowels.\n\n\
         Return ONLY a raw JSON array."
    )
}

/// Strips markdown code-fence wrappers the generator sometimes adds.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses a (possibly fenced) JSON array of practice words.
pub fn parse_word_list(text: &str) -> Result<Vec<PracticeWord>> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).context("parsing practice word list")
}

#[derive(Serialize)]
struct PromptBody<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

fn nested_text(response: GenerationResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}

/// Client for the word-generation relay endpoint.
pub struct GenerationClient {
    endpoint: String,
    http: reqwest::blocking::Client,
}

impl GenerationClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building word generation HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }
}

impl WordSource for GenerationClient {
    fn fetch(&self, request: &WordRequest) -> Result<Vec<PracticeWord>> {
        let prompt = build_prompt(request.level, &request.phonemes);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&PromptBody { prompt: &prompt })
            .send()
            .with_context(|| format!("requesting practice words from {}", self.endpoint))?;
        let status = response.status();
        ensure!(status.is_success(), "word generation endpoint returned {status}");
        let payload: GenerationResponse =
            response.json().context("decoding word generation response")?;
        let text = nested_text(payload)
            .context("word generation response carried no text payload")?;
        parse_word_list(&text)
    }
}

/// Reads a JSON word list from disk; the file is re-read on every fetch so
/// regeneration picks up edits.
pub struct FileWords {
    path: PathBuf,
}

impl FileWords {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl WordSource for FileWords {
    fn fetch(&self, _request: &WordRequest) -> Result<Vec<PracticeWord>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading word list {}", self.path.display()))?;
        parse_word_list(&raw)
    }
}

/// Always serves the bundled fallback list; the offline source of last
/// resort when neither an endpoint nor a words file is configured.
pub struct BuiltinWords;

impl WordSource for BuiltinWords {
    fn fetch(&self, _request: &WordRequest) -> Result<Vec<PracticeWord>> {
        Ok(fallback_words())
    }
}
