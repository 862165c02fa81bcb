//! Text rendering of the gallows figure and game status

use shared::{LetterMask, Outcome, Response, MAX_MISTAKES};

/// Full figure; `STAGES` says at which mistake count each character appears.
const FIGURE: [&str; 7] = [
    " +----+",
    " |    |",
    " |    O",
    " |   /|\\",
    " |   / \\",
    " |",
    "=====",
];

const STAGES: [&str; 7] = [
    " 233333",
    " 2    4",
    " 2    5",
    " 2   768",
    " 2   9 9",
    " 2",
    "11111",
];

/// Draws the gallows for `mistakes` wrong guesses (0 is empty, 9 is complete).
pub fn render_figure(mistakes: u32) -> String {
    let mistakes = mistakes.min(MAX_MISTAKES);
    let mut figure = String::new();

    for (art, stages) in FIGURE.iter().zip(STAGES.iter()) {
        let line: String = art
            .chars()
            .zip(stages.chars())
            .map(|(ch, stage)| match stage.to_digit(10) {
                Some(stage) if stage <= mistakes => ch,
                _ => ' ',
            })
            .collect();
        figure.push_str(line.trim_end());
        figure.push('\n');
    }
    figure
}

/// Spreads the revealed word out so placeholders are countable: `C _ T`.
pub fn render_word(revealed: &str) -> String {
    let mut spaced = String::with_capacity(revealed.len() * 2);
    for (index, ch) in revealed.chars().enumerate() {
        if index > 0 {
            spaced.push(' ');
        }
        spaced.push(ch);
    }
    spaced
}

pub fn render_guessed(guessed: &LetterMask) -> String {
    let letters: Vec<String> = guessed.letters().map(String::from).collect();
    if letters.is_empty() {
        "Guessed: -".to_string()
    } else {
        format!("Guessed: {}", letters.join(" "))
    }
}

/// One-line summary for finished games. `None` while the game is running.
pub fn outcome_banner(response: &Response) -> Option<String> {
    match response.outcome {
        Outcome::InProgress => None,
        Outcome::Won => Some(format!("You won! The word was {}.", response.revealed_word())),
        Outcome::Lost => Some(format!("You lost. The word was {}.", response.revealed_word())),
        Outcome::NoMoreWords => Some("No more words left, thanks for playing!".to_string()),
        Outcome::ProtocolViolation => Some("The server rejected the request.".to_string()),
    }
}

/// Complete screen for one response.
pub fn render_response(response: &Response) -> String {
    let mut screen = render_figure(response.mistake_count);
    screen.push('\n');
    screen.push_str(&render_word(response.revealed_word()));
    screen.push_str("\n\n");
    screen.push_str(&render_guessed(&response.guessed));
    screen.push('\n');
    screen.push_str(&format!(
        "Mistakes: {}/{}   Wins: {}   Losses: {}\n",
        response.mistake_count, MAX_MISTAKES, response.wins, response.losses
    ));
    if let Some(banner) = outcome_banner(response) {
        screen.push_str(&banner);
        screen.push('\n');
    }
    screen
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::WordBuffer;

    #[test]
    fn test_figure_stages_match_art() {
        for (art, stages) in FIGURE.iter().zip(STAGES.iter()) {
            assert_eq!(art.chars().count(), stages.chars().count(), "{:?}", art);
        }
    }

    #[test]
    fn test_empty_figure() {
        assert!(render_figure(0).trim().is_empty());
    }

    #[test]
    fn test_figure_grows_with_mistakes() {
        assert!(render_figure(1).contains("====="));
        assert!(!render_figure(1).contains('|'));
        assert!(render_figure(5).contains('O'));
        assert!(!render_figure(5).contains('/'));

        let complete = render_figure(MAX_MISTAKES);
        assert_eq!(complete, render_figure(MAX_MISTAKES + 3));
        assert!(complete.contains("/|\\"));
        assert!(complete.contains("/ \\"));
    }

    #[test]
    fn test_each_stage_adds_ink() {
        let ink = |mistakes| render_figure(mistakes).chars().filter(|c| !c.is_whitespace()).count();
        for mistakes in 1..=MAX_MISTAKES {
            assert!(ink(mistakes) > ink(mistakes - 1), "stage {}", mistakes);
        }
    }

    #[test]
    fn test_render_word_spacing() {
        assert_eq!(render_word("C_T"), "C _ T");
        assert_eq!(render_word(""), "");
    }

    #[test]
    fn test_render_guessed() {
        let mut guessed = LetterMask::new();
        assert_eq!(render_guessed(&guessed), "Guessed: -");
        guessed.insert('T');
        guessed.insert('C');
        assert_eq!(render_guessed(&guessed), "Guessed: C T");
    }

    #[test]
    fn test_render_response_includes_tally_and_banner() {
        let response = Response {
            client_id: 1,
            mistake_count: 2,
            wins: 3,
            losses: 1,
            revealed: WordBuffer::from_text("CAT"),
            outcome: Outcome::Won,
            ..Response::default()
        };
        let screen = render_response(&response);

        assert!(screen.contains("C A T"));
        assert!(screen.contains("Mistakes: 2/9   Wins: 3   Losses: 1"));
        assert!(screen.contains("You won! The word was CAT."));
    }

    #[test]
    fn test_no_banner_while_playing() {
        assert_eq!(outcome_banner(&Response::default()), None);
    }
}
