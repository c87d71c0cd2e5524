// Prompt templates for resume analysis.

pub const PROFILE_EXTRACT_SYSTEM: &str = "\
You are a resume parser for an applicant tracking system. \
You turn raw resume text into structured candidate data.";

pub const PROFILE_EXTRACT_PROMPT: &str = r#"Extract the candidate's structured profile from the resume text below.
If a value is not available, return null for it, or an empty array for list fields.

FIELDS:
- location: where the candidate is based
- languages: spoken languages
- summary: a short professional summary
- educations: [{ major, degree, institution }]
- experiences: [{ role, company, duration, responsibilities: [string] }]
- yearOfExperience: total years of professional experience as a number
- profileLinks: URLs to portfolios, LinkedIn, GitHub and similar

RESUME:
{resume_text}"#;

pub const SCREENING_SYSTEM: &str = "\
You are an ATS evaluator. You compare a resume against a job description \
and report how well the candidate fits, strictly and reproducibly.";

pub const SCREENING_PROMPT: &str = r#"Analyze the resume below against the job description below.

RULES:
1. Use exactly the job description and resume given here. Identical inputs must yield an identical analysis and match percentage.
2. Infer skills implied by the candidate's experience. Building an e-commerce site that integrates third-party APIs implies REST API experience.
3. Separate core skills from tooling. Tools such as GitHub, Jira or Trello never count as missing skills.
4. Consider only hard and soft skills relevant to the job description.
5. Compute matchPercentage (0-100) from the required and nice-to-have skills only.
6. accurateKeywords lists the skills the resume covers; missingKeywords lists the skills it lacks. A keyword appears in at most one list.
7. recommendations must be concrete additions that would read naturally on the resume.
8. Apply the recruiter's custom requirements on top of the job description when present.

JOB DESCRIPTION:
{job_description}

RESUME:
{resume_text}

CUSTOM REQUIREMENTS (from recruiter):
{custom_requirement}"#;
