use std::io::Write;

use anyhow::{Context, Result};
use uuid::Uuid;

use flashquiz_lib::flashcards::{
    FlashcardSet, GeneratedQuestion, NewStudySession, QuestionType, StudyMode, ThreadRandom,
};
use flashquiz_lib::study::{
    Feedback, MatchBoard, Phase, ReviewCard, StudyController, StudyItem, FEEDBACK_DELAY,
};

use crate::app::App;
use crate::render::terminal::{paint, score_line, Color};

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read answer")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn fetch_items(app: &App, set_id: Uuid, mode: StudyMode) -> Result<Vec<StudyItem>> {
    let items = match mode {
        StudyMode::Quiz => StudyItem::from_quiz(app.client.quiz(set_id).await?),
        StudyMode::Test => StudyItem::from_test(app.client.test_mode(set_id).await?),
        _ => StudyItem::from_cards(&app.client.flashcard_mode(set_id).await?),
    };
    Ok(items)
}

fn show_card(card: &ReviewCard, use_color: bool) -> Result<bool> {
    println!("{}", paint(&card.front, Color::BOLD, use_color));
    prompt("  (press Enter to flip) ")?;
    println!("  {}", paint(&card.back, Color::CYAN, use_color));

    loop {
        match prompt("  Memorized? [y/n] ")?.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}

/// Read an answer; numbered options may be picked by number
fn ask_question(question: &GeneratedQuestion, use_color: bool) -> Result<String> {
    println!("{}", paint(&question.question, Color::BOLD, use_color));

    match (question.kind, &question.options) {
        (QuestionType::Multiple, Some(options)) => {
            for (i, option) in options.iter().enumerate() {
                println!("  {}. {}", i + 1, option);
            }
            let raw = prompt("  Your choice: ")?;
            let picked = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i));
            Ok(picked.cloned().unwrap_or(raw))
        }
        (QuestionType::TrueFalse, _) => prompt("  Đúng / Sai: "),
        _ => prompt("  Your answer: "),
    }
}

fn show_feedback(feedback: &Feedback, use_color: bool) {
    let color = if feedback.correct { Color::GREEN } else { Color::RED };
    println!("  {}", paint(&feedback.message, color, use_color));
}

async fn save(app: &App, result: &NewStudySession, use_color: bool) {
    println!(
        "\nDone! Score: {}",
        paint(&score_line(result.score, result.total_questions), Color::BOLD, use_color)
    );
    if let Err(e) = app.client.save_result(result).await {
        log::warn!("Saving study result failed: {}", e);
        println!("{}", paint(&format!("Could not save result: {}", e), Color::RED, use_color));
    }
}

/// Play the current attempt to completion and submit its result once
async fn play(app: &App, study: &mut StudyController, use_color: bool) -> Result<()> {
    while let Some(item) = study.current().cloned() {
        println!(
            "\n{}",
            paint(
                &format!("[{}/{}]", study.position() + 1, study.total()),
                Color::DIM,
                use_color
            )
        );

        match item {
            StudyItem::Card(card) => {
                let memorized = show_card(&card, use_color)?;
                study.mark_card(memorized)?;
                if let Some(id) = card.id {
                    if let Err(e) = app
                        .client
                        .update_card(id, &card.front, &card.back, Some(memorized))
                        .await
                    {
                        log::warn!("Updating flashcard {} failed: {}", id, e);
                        println!(
                            "{}",
                            paint(&format!("Failed to update flashcard: {}", e), Color::RED, use_color)
                        );
                    }
                }
            }
            StudyItem::Question(question) => {
                let answer = ask_question(&question, use_color)?;
                let feedback = study.submit_answer(&answer)?;
                show_feedback(&feedback, use_color);
                tokio::time::sleep(FEEDBACK_DELAY).await;
            }
        }

        if let Some(result) = study.advance()? {
            save(app, &result, use_color).await;
        }
    }
    Ok(())
}

/// Parse "<front> <back>" as two one-based positions
fn parse_pick(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace().map(|p| p.parse::<usize>().ok()?.checked_sub(1));
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Some(front)), Some(Some(back)), None) => Some((front, back)),
        _ => None,
    }
}

fn show_board(board: &MatchBoard, use_color: bool) {
    println!(
        "\n{}",
        paint(&format!("[{}/{} matched]", board.matched(), board.total()), Color::DIM, use_color)
    );
    let width = board.fronts().iter().map(|f| f.chars().count()).max().unwrap_or(0);
    for (i, (front, back)) in board.fronts().iter().zip(board.backs()).enumerate() {
        let pad = width - front.chars().count();
        println!(
            "  {:>2}. {}{}    {:>2}. {}",
            i + 1,
            paint(front, Color::BOLD, use_color),
            " ".repeat(pad),
            i + 1,
            paint(back, Color::CYAN, use_color)
        );
    }
}

async fn play_match(app: &App, set: &FlashcardSet, use_color: bool) -> Result<()> {
    loop {
        let pairs = app
            .client
            .match_mode(set.id)
            .await
            .context("Failed to load study items")?;
        let mut board = MatchBoard::new(set.id, pairs, &mut ThreadRandom)?;

        while !board.is_complete() {
            show_board(&board, use_color);
            let line = prompt("  Pair (front back): ")?;
            if line.trim().eq_ignore_ascii_case("q") {
                return Ok(());
            }
            let Some((front, back)) = parse_pick(&line) else {
                println!("  Enter two numbers, e.g. \"1 3\", or q to quit");
                continue;
            };

            match board.pick(front, back) {
                Ok(pick) if pick.matched => {
                    println!("  {}", paint("Đúng!", Color::GREEN, use_color));
                    if let Some(result) = pick.session {
                        save(app, &result, use_color).await;
                    }
                }
                Ok(_) => println!("  {}", paint("Sai!", Color::RED, use_color)),
                Err(e) => println!("  {}", e),
            }
        }

        match prompt("[r]etry, [q]uit: ")?.trim().to_lowercase().as_str() {
            "r" | "retry" => continue,
            _ => return Ok(()),
        }
    }
}

pub async fn run(app: &App, set_name: &str, mode: StudyMode, use_color: bool) -> Result<()> {
    let set = app.find_set(set_name).await?;
    println!("Studying \"{}\" in {} mode", set.title, mode);

    if mode == StudyMode::Match {
        return play_match(app, &set, use_color).await;
    }

    let mut study = StudyController::new();
    let items = fetch_items(app, set.id, mode)
        .await
        .context("Failed to load study items")?;
    study.begin(set.id, mode, items)?;

    loop {
        play(app, &mut study, use_color).await?;
        if study.phase() != Phase::Complete {
            break;
        }

        let missed = study.missed().len();
        let choice = if missed > 0 {
            prompt(&format!("[r]etry, re[v]iew {} missed, [q]uit: ", missed))?
        } else {
            prompt("[r]etry, [q]uit: ")?
        };

        match choice.trim().to_lowercase().as_str() {
            "r" | "retry" => {
                let items = fetch_items(app, set.id, study.mode())
                    .await
                    .context("Failed to load study items")?;
                study.retry(items)?;
            }
            "v" | "review" if missed > 0 => study.review_missed()?,
            _ => {
                study.back_to_select();
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pick() {
        assert_eq!(parse_pick("1 3"), Some((0, 2)));
        assert_eq!(parse_pick("  2\t1 "), Some((1, 0)));
        assert_eq!(parse_pick("0 1"), None);
        assert_eq!(parse_pick("1"), None);
        assert_eq!(parse_pick("1 2 3"), None);
        assert_eq!(parse_pick("a b"), None);
    }
}
