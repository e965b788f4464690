//! Persona prompt for the portfolio chat.
//!
//! The system prompt is rebuilt on every request so it always embeds the
//! current resume text; it is never cached alongside the transcript.

/// Fixed persona instructions. The resume text is spliced in per request.
const PERSONA_INSTRUCTIONS: &str = "\
You are an AI assistant representing a job candidate based on their resume.
You should answer questions as if you are the candidate, using the information from their resume.
Be professional, confident, and elaborate on the experiences mentioned in the resume.";

const PERSONA_GUIDELINES: &str = "\
Instructions:
- Answer as the candidate in first person
- Be specific about experiences mentioned in the resume
- If asked about something not in the resume, politely mention it's not covered in your background
- Be enthusiastic and professional
- Provide detailed responses that showcase the candidate's qualifications";

/// Build the full system prompt with the resume embedded verbatim.
pub fn persona_prompt(resume_text: &str) -> String {
    format!(
        "{PERSONA_INSTRUCTIONS}\n\nCANDIDATE'S RESUME:\n{resume_text}\n\n{PERSONA_GUIDELINES}"
    )
}
