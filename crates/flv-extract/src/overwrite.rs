//! Overwrite confirmation.
//!
//! Before an output replaces an existing file, the batch asks an
//! [`OverwritePrompt`]. "Yes to all" and "no to all" answers stick for the
//! rest of the batch through [`OverwritePolicy`].

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use serde::Serialize;
use tracing::debug;

use crate::batch::StopFlag;

/// Answer to one overwrite question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    YesToAll,
    No,
    NoToAll,
    /// Keep the file and stop the batch after the current input
    Cancel,
}

/// Batch-wide overwrite behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Ask for every existing file
    #[default]
    Ask,
    /// Replace without asking
    All,
    /// Keep every existing file without asking
    None,
}

impl OverwritePolicy {
    /// Decides whether `path` may be replaced, asking `prompt` when the policy
    /// is [`OverwritePolicy::Ask`] and recording sticky answers.
    ///
    /// A raised `stop` does not change the answer; the batch only looks at it
    /// between files. [`Decision::Cancel`] raises it and keeps every further
    /// file without asking.
    pub fn confirm(&mut self, path: &Path, prompt: &mut dyn OverwritePrompt, stop: &StopFlag) -> bool {
        match self {
            OverwritePolicy::All => return true,
            OverwritePolicy::None => return false,
            OverwritePolicy::Ask => {}
        }

        let decision = prompt.confirm(path);
        debug!(path = %path.display(), ?decision, "overwrite decision");
        match decision {
            Decision::Yes => true,
            Decision::YesToAll => {
                *self = OverwritePolicy::All;
                true
            }
            Decision::No => false,
            Decision::NoToAll => {
                *self = OverwritePolicy::None;
                false
            }
            Decision::Cancel => {
                *self = OverwritePolicy::None;
                stop.stop();
                false
            }
        }
    }
}

/// Asked whether an existing output file may be replaced.
pub trait OverwritePrompt: Send {
    fn confirm(&mut self, path: &Path) -> Decision;
}

impl<F> OverwritePrompt for F
where
    F: FnMut(&Path) -> Decision + Send,
{
    fn confirm(&mut self, path: &Path) -> Decision {
        self(path)
    }
}

/// One pending question, answered on the thread that owns the user
/// interaction.
#[derive(Debug)]
pub struct PromptRequest {
    path: PathBuf,
    reply: Sender<Decision>,
}

impl PromptRequest {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sends the answer back to the waiting worker.
    pub fn answer(self, decision: Decision) {
        // The worker may have gone away, nothing left to answer then
        let _ = self.reply.send(decision);
    }
}

/// Prompt that hands each question to another thread and blocks until it is
/// answered.
///
/// A request dropped without an answer, or a dropped receiver, counts as
/// [`Decision::Cancel`].
#[derive(Debug, Clone)]
pub struct ForegroundPrompt {
    requests: Sender<PromptRequest>,
}

impl ForegroundPrompt {
    /// Returns the prompt and the receiving end the foreground thread polls.
    pub fn new() -> (Self, Receiver<PromptRequest>) {
        let (requests, receiver) = unbounded();
        (Self { requests }, receiver)
    }
}

impl OverwritePrompt for ForegroundPrompt {
    fn confirm(&mut self, path: &Path) -> Decision {
        let (reply, answer) = bounded(1);
        let request = PromptRequest {
            path: path.to_path_buf(),
            reply,
        };
        if self.requests.send(request).is_err() {
            return Decision::Cancel;
        }
        answer.recv().unwrap_or(Decision::Cancel)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::thread;

    use super::*;

    fn scripted(answers: Vec<Decision>) -> impl FnMut(&Path) -> Decision + Send {
        let mut answers = answers.into_iter();
        move |_: &Path| answers.next().expect("prompt asked too often")
    }

    #[test]
    fn test_sticky_answers() {
        let stop = StopFlag::new();
        let path = Path::new("out.audio.aac");

        let mut policy = OverwritePolicy::Ask;
        let mut prompt = scripted(vec![Decision::Yes, Decision::No, Decision::YesToAll]);
        assert!(policy.confirm(path, &mut prompt, &stop));
        assert!(!policy.confirm(path, &mut prompt, &stop));
        assert!(policy.confirm(path, &mut prompt, &stop));
        assert_eq!(policy, OverwritePolicy::All);
        // Not asked again
        assert!(policy.confirm(path, &mut prompt, &stop));

        let mut policy = OverwritePolicy::Ask;
        let mut prompt = scripted(vec![Decision::NoToAll]);
        assert!(!policy.confirm(path, &mut prompt, &stop));
        assert!(!policy.confirm(path, &mut prompt, &stop));
        assert_eq!(policy, OverwritePolicy::None);
    }

    #[test]
    fn test_cancel_raises_stop() {
        let stop = StopFlag::new();
        let mut policy = OverwritePolicy::Ask;
        let mut prompt = scripted(vec![Decision::Cancel]);

        assert!(!policy.confirm(Path::new("a"), &mut prompt, &stop));
        assert!(stop.is_stopped());
        assert_eq!(policy, OverwritePolicy::None);
        // Later questions are declined without asking
        assert!(!policy.confirm(Path::new("b"), &mut prompt, &stop));
    }

    #[test]
    fn test_raised_stop_still_asks() {
        let stop = StopFlag::new();
        stop.stop();
        let mut policy = OverwritePolicy::Ask;
        let mut prompt = scripted(vec![Decision::Yes, Decision::No]);

        assert!(policy.confirm(Path::new("a"), &mut prompt, &stop));
        assert!(!policy.confirm(Path::new("b"), &mut prompt, &stop));
        assert_eq!(policy, OverwritePolicy::Ask);
    }

    #[test]
    fn test_foreground_rendezvous() {
        let (mut prompt, requests) = ForegroundPrompt::new();

        let worker = thread::spawn(move || {
            let first = prompt.confirm(Path::new("first.video.264"));
            let second = prompt.confirm(Path::new("second.video.264"));
            (first, second)
        });

        let request = requests.recv().unwrap();
        assert_eq!(request.path(), Path::new("first.video.264"));
        request.answer(Decision::YesToAll);

        let request = requests.recv().unwrap();
        drop(request);

        assert_eq!(worker.join().unwrap(), (Decision::YesToAll, Decision::Cancel));
    }

    #[test]
    fn test_foreground_gone() {
        let (mut prompt, requests) = ForegroundPrompt::new();
        drop(requests);
        assert_eq!(prompt.confirm(Path::new("x")), Decision::Cancel);
    }
}
