// Room analysis prompt templates.
// All prompts for the analysis module are defined here.

/// Room analysis prompt. Replace `{furniture_key}` and `{catalog}` before sending.
pub const ROOM_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the attached photo of a room and return a JSON object with these keys:
- "description": a description of the room
- "type": the type of room, e.g. kitchen, living room, bedroom
- "style": era, mood, style and design of the room
- "size": one of "small", "medium", "large"
- "colours": list of the key colours, as specific as possible
{furniture_key}

Only use ids that appear in FURNITURE_DATA. Return ONLY the JSON object.

FURNITURE_DATA:
{catalog}"#;

/// Simple mode: a flat id list.
pub const FURNITURE_IDS_KEY: &str = r#"- "furniture_ids": array of at least 10 ids from FURNITURE_DATA that best match the description, style, size and colours"#;

/// Ranked mode: ids with a short justification, best match first.
pub const RECOMMENDATIONS_KEY: &str = r#"- "recommendations": array of at least 10 objects {"furniture_id": "<id from FURNITURE_DATA>", "reason": "<one sentence on why it suits this room>"}, ordered best match first, chosen for the description, style, size and colours"#;
