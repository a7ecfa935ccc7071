mod answers;
mod question;
mod result;

pub use answers::{AnswerCheck, AnswerMap, AnswerSubmission};
pub use question::{OptionId, Question, QuestionId, QuizOption, TaskId};
pub use result::{Rewards, SessionResult};
