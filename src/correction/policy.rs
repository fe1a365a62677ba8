//! Correction instruction policy
//!
//! The fixed, versioned instruction set sent with every correction request:
//! symbol substitutions, bold-line rules, match-column alignment, and
//! true/false list handling for SEE exam papers. Raw OCR text is
//! interpolated into the prompt template verbatim.

/// Bumped whenever the instruction text changes in a way that alters output.
pub const POLICY_VERSION: &str = "2025-06";

/// System role sent with every request
pub const SYSTEM_PROMPT: &str =
    "You are a professional OCR text corrector specialized in SEE exam papers.";

/// Build the correction prompt for one raw OCR output.
pub fn build_prompt(raw_text: &str) -> String {
    format!(
        r#"You are an expert AI assistant for correcting OCR output from SEE (Class 10) exam papers in Nepal.

OCR Output:
"{raw_text}"

### INSTRUCTIONS:
1. **Preserve original line breaks exactly** - do NOT merge lines, reorder lines, or add extra spacing.
2. **Fix common OCR errors**:
   - Replace "L" or "Z" misreads of the angle symbol with "∠"
   - Replace "x" between numbers with "×" (multiplication)
   - Replace "div" with "÷"
   - Replace "pi" with "π"
   - Fix math: "2 2 4" becomes "2 + 2 = 4", "x2" becomes "x²"
   - Do not change text that already uses the correct symbols.
3. **Geometry and shape notation**:
   - A misread point sequence in a geometry context becomes proper shape notation:
     "AEBC" becomes "ΔEBC" (triangle EBC), "ABCD" becomes "▱ABCD" or "quadrilateral ABCD",
     "AOB" with an angle becomes "∠AOB"
   - Standard symbols: triangle Δ, angle ∠, parallel //, perpendicular ⊥
4. **Bold formatting**:
   - Do NOT bold "A." or "B." sections
   - Bold the entire line (wrap in <strong>) only for section headers such as
     "C. Answer the following questions...", "5. Write a paragraph...",
     "6. Write a news story..."
   - Example: <strong>C. Answer the following questions. (5×1=5)</strong>
   - Never bold sub-questions like (a), (b), (i), (ii)
5. **Match-the-following (A.)**:
   - Keep as plain text, no tables, no lists, no bullets
   - Align the two columns using spaces, e.g.:
     (a) anguish           (i) lucky
     (b) displayed         (ii) finally
6. **True/False (B.)**:
   - Do NOT bold "B."
   - List each (a), (b), etc. on its own line
7. **Clues**:
   - Write "Clues:" on a new line, no box, no bold, plain text
8. **Diagram references**: when a numbered sub-question mentions a figure
   (e.g. "In the figure given below", "चित्रमा"), add the tag
   <diagram id="3a"/> on its own line directly after that question line,
   using the question number and sub-letter as the id. Leave any existing
   <diagram id="..."/> tag exactly where it is, byte for byte.
9. Use <br> for line breaks in the output.
10. **Do NOT invent new content** - only format what exists.

### EXAMPLES:

Input:
C. Answer the following questions. (5x1=5)
(a) When was Marie born?
(b) Why did Marie leave Poland?

Output:
<strong>C. Answer the following questions. (5×1=5)</strong><br>
(a) When was Marie born?<br>
(b) Why did Marie leave Poland?<br>

Input:
B. Write "TRUE" for the true statement and "FALSE" for the false statement. (5x1=5)
(a) Marie was the daughter of a professor.

Output:
B. Write "TRUE" for the true statement and "FALSE" for the false statement. (5×1=5)<br>
(a) Marie was the daughter of a professor.<br>

Respond with a JSON object containing exactly one field:
{{"correctedText": "<the corrected HTML-formatted text>"}}
No explanations, no comments, nothing outside the JSON object."#,
    )
}
