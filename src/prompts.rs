//! Prompts for résumé analysis.
//!
//! Every prompt lives here so wording changes touch exactly one place and
//! tests can inspect prompts without calling a model.

/// System prompt sent ahead of the per-submission instructions.
pub const ANALYST_SYSTEM_PROMPT: &str = "You are an expert in ATS (Applicant Tracking System) \
and résumé review. You read the attached résumé image carefully and answer strictly in the \
requested format.";

/// Shape of the feedback document the model must return.
///
/// Kept in sync with [`crate::record::ResumeFeedback`].
pub const FEEDBACK_FORMAT: &str = r#"interface Feedback {
  overallScore: number; // max 100
  ATS: {
    score: number; // rate based on ATS suitability
    tips: {
      type: "good" | "improve";
      tip: string; // give 3-4 tips
    }[];
  };
  toneAndStyle: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // make it a short "title" for the actual explanation
      explanation: string; // explain in detail here
    }[]; // give 3-4 tips
  };
  content: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string;
      explanation: string;
    }[];
  };
  structure: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string;
      explanation: string;
    }[];
  };
  skills: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string;
      explanation: string;
    }[];
  };
}"#;

/// Build the analysis instructions for one submission.
///
/// Empty job fields are passed through as-is; the model is told to review the
/// résumé on its own merits when no job context is given.
pub fn prepare_instructions(job_title: &str, job_description: &str, response_format: &str) -> String {
    format!(
        "Please analyze and rate this resume and suggest how to improve it.\n\
The rating can be low if the resume is bad.\n\
Be thorough and detailed. Don't be afraid to point out any mistakes or areas for improvement.\n\
If there is a lot to improve, don't hesitate to give low scores. This is to help the user improve their resume.\n\
If available, use the job description for the job the user is applying to, to give more detailed feedback.\n\
If provided, take the job description into consideration.\n\
The job title is: {job_title}\n\
The job description is: {job_description}\n\
Provide the feedback using the following format:\n\
{FEEDBACK_FORMAT}\n\
Return the analysis as a {response_format} object, without any other text and without the backticks.\n\
Do not include any other text or comments."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_embed_job_context_and_format() {
        let text = prepare_instructions("Engineer", "Build things", "json");
        assert!(text.contains("The job title is: Engineer"));
        assert!(text.contains("The job description is: Build things"));
        assert!(text.contains("as a json object"));
        assert!(text.contains("overallScore"));
    }

    #[test]
    fn instructions_accept_empty_fields() {
        let text = prepare_instructions("", "", "json");
        assert!(text.contains("The job title is: \n"));
    }

    #[test]
    fn format_names_every_category() {
        for field in ["ATS", "toneAndStyle", "content", "structure", "skills"] {
            assert!(FEEDBACK_FORMAT.contains(field), "missing {field}");
        }
    }
}
