// All LLM prompt constants for the generation pipeline. Loaded once as
// static configuration — never rebuilt per request.

/// System prompt for skill-tree extraction — enforces JSON-only output.
pub const SKILL_EXTRACT_SYSTEM: &str =
    "You are an expert technical recruiter and curriculum designer. \
    Read a job description and extract the competency hierarchy it implies. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Skill extraction prompt template. Replace `{jd_text}` before sending.
pub const SKILL_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract a hierarchical skill tree from the following job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "domains": [
    {
      "name": "Go",
      "children": [
        {
          "name": "Concurrency",
          "children": [
            {"name": "Goroutine scheduling", "tags": ["runtime"]}
          ]
        }
      ]
    }
  ]
}

Rules:
- Top-level "domains" are broad areas (a language, a platform, a discipline).
- Nest from domain down to concrete knowledge points. Keep the tree at most 4 levels deep.
- "tags" is optional and only appears on leaf nodes, as short lowercase labels.
- Include only skills actually implied by the job description — do not pad.

JOB DESCRIPTION:
{jd_text}"#;

/// System prompt for question derivation — enforces JSON-only output.
pub const QUESTION_SYSTEM: &str =
    "You are a senior interviewer designing non-formulaic interview questions. \
    Given a skill tree, produce questions that probe real understanding rather \
    than recitation. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Question derivation prompt template. Replace `{skill_tree}` before sending.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Derive interview questions from the following skill tree.

Return a JSON object with this EXACT schema (no extra fields):
{
  "questions": [
    {
      "category": "Go",
      "skill": "Concurrency",
      "strategy": "scenario",
      "level": "senior",
      "question": "Your worker pool deadlocks under load. Walk me through how you would diagnose it.",
      "tags": ["goroutines", "debugging"]
    }
  ]
}

Rules:
- "category" is the domain the question belongs to; "skill" the specific node it probes.
- "strategy" is one of: "scenario", "tradeoff", "debugging", "design", "experience".
- "level" is one of: "junior", "mid", "senior", "staff".
- Prefer situational and trade-off questions over definition recall.
- Cover every domain in the tree; weight deeper branches more heavily.

SKILL TREE:
{skill_tree}"#;
