//! Built-in content: the default "Cognitive Assessment" battery.
//!
//! Fifty items, ten per cognitive domain, seeded at startup unless the config
//! turns it off. Options are stored the way clients expect them: a JSON array
//! string, letter keys assigned in order ("a", "b", ...).

use crate::domain::{Category, QuestionType};
use crate::store::{NewQuestion, NewTest};

const AR: Category = Category::AnalyticalReasoning;
const WM: Category = Category::WorkingMemory;
const PS: Category = Category::ProcessingSpeed;
const AF: Category = Category::AttentionFocus;
const ER: Category = Category::EmotionalRegulation;

pub fn builtin_test() -> NewTest {
  NewTest {
    name: "Cognitive Assessment".into(),
    description: "A comprehensive cognitive assessment test covering analytical reasoning, working memory, \
                  processing speed, attention & focus, and emotional regulation"
      .into(),
    duration: 60,
  }
}

/// JSON array string for a list of option labels; `None` when there are no options.
pub fn options_json(options: &[&str]) -> Option<String> {
  if options.is_empty() {
    None
  } else {
    serde_json::to_string(options).ok()
  }
}

#[allow(clippy::too_many_arguments)]
fn q(
  order_index: u32,
  category: Category,
  question_type: QuestionType,
  text: &str,
  options: &[&str],
  correct_answer: &str,
  time_limit: u32,
  display_time: u32,
) -> NewQuestion {
  NewQuestion {
    question_text: text.into(),
    question_type,
    category,
    options: options_json(options),
    correct_answer: correct_answer.into(),
    time_limit,
    display_time,
    order_index,
  }
}

pub fn builtin_questions() -> Vec<NewQuestion> {
  use QuestionType::*;
  vec![
    // Analytical reasoning
    q(1, AR, MultipleChoice, "What is the next number in this sequence? 3, 9, 27, 81, ___",
      &["108", "162", "243", "324"], "c", 30, 0),
    q(2, AR, MultipleChoice, "Logic chains: All bloops are razzles. All razzles are squibs. Which statement must be true?",
      &["All squibs are bloops", "All bloops are squibs", "Some squibs are bloops", "No bloops are squibs"], "b", 30, 0),
    q(3, AR, MultipleChoice, "Odd-one-out: Which word does NOT belong with the others?",
      &["Tulip", "Rose", "Oak", "Lily"], "c", 30, 0),
    q(4, AR, MultipleChoice, "Analogy: Cell is to Organ as Brick is to _____.",
      &["Cement", "Wall", "Mortar", "Clay"], "b", 30, 0),
    q(5, AR, MultipleChoice, "In a standard 52-card deck, how many cards are both red and face cards?",
      &["2", "4", "6", "8"], "c", 30, 0),
    q(6, AR, MultipleChoice, "If 1 January 2026 falls on a Thursday, what weekday is 1 January 2027?",
      &["Friday", "Saturday", "Sunday", "Monday"], "a", 30, 0),
    q(7, AR, MultipleChoice, "Given A > B and B > C, which statement must be true?",
      &["A > C", "C > A", "B > A", "A = C"], "a", 30, 0),
    q(8, AR, MultipleChoice, "A bookstore sells pens at ₹15 each or a box of 5 for ₹60. What is the minimum cost to buy exactly 13 pens?",
      &["₹150", "₹165", "₹180", "₹195"], "b", 30, 0),
    q(9, AR, MultipleChoice, "Which fraction is exactly halfway between ⅓ and ½?",
      &["5⁄12", "7⁄12", "5⁄6", "2⁄5"], "a", 30, 0),
    q(10, AR, MultipleChoice, "In a three-circle Venn diagram, how many regions contain exactly two sets but not the third?",
      &["1", "2", "3", "4"], "c", 30, 0),

    // Working memory
    q(11, WM, TextInput, "Digits appear for 3 seconds: 7 2 9 4 6. Type them in the same order.",
      &[], "72946", 10, 3),
    q(12, WM, TextInput, "Digits appear for 3 seconds: 3 8 1 5. Type them in reverse order.",
      &[], "5183", 10, 3),
    q(13, WM, TextInput, "Item list shows for 5 seconds: apple, chair, cloud, river, gold. What was the third item? (type one word)",
      &[], "cloud", 10, 5),
    q(14, WM, TextInput, "A 4×4 grid flashes for 5 seconds. Which letter was in row 2, column 3?",
      &[], "2", 10, 5),
    q(15, WM, KeySequence, "Watch the key positions [up → down → right → left]. Click the positions in the same order.",
      &[], "up,down,right,left", 15, 3),
    q(16, WM, TextInput, "Sentence shows for 5 seconds: 'A tiny bird perched quietly on the rusty mailbox.' What was the fifth word? (type one word)",
      &[], "quietly", 10, 5),
    q(17, WM, NumberInput, "Solve mentally: 12 + 7 − 3 × 2 = ? You will be asked for the result later—remember it.",
      &[], "13", 15, 0),
    q(18, WM, TextInput, "You'll see the letters L G K Q T once. Type them alphabetically.",
      &[], "gklqt", 15, 3),
    q(19, WM, TextInput, "After 5s, answer: Which two adjectives appeared in 'She swiftly closed the heavy wooden door behind her.'? (type two words)",
      &[], "heavy,wooden", 15, 5),
    q(20, WM, NumberInput, "Add these numbers mentally: 24, 57, 38. Enter the total.",
      &[], "119", 15, 0),

    // Processing speed
    q(21, PS, MultipleChoice, "14 × 6 − 32 = ?",
      &["40", "52", "56", "68"], "b", 5, 0),
    q(22, PS, MultipleChoice, "Solve in under 10s: (17 + 8) ÷ 5 = ?",
      &["3", "4", "5", "25"], "c", 10, 0),
    q(23, PS, MultipleChoice, "Which is the smallest decimal?",
      &["0.29", "0.294", "0.298", "0.30"], "a", 5, 0),
    q(24, PS, MultipleChoice, "Without a calculator, 8% of 250 = ?",
      &["18", "20", "22", "25"], "b", 5, 0),
    q(25, PS, MultipleChoice, "Pick the correctly spelled word:",
      &["Occurence", "Occurrence", "Occurrance", "Occurrense"], "b", 5, 0),
    q(26, PS, MultipleChoice, "Synonym of 'candid' is _____.",
      &["Frank", "Secretive", "False", "Reserved"], "a", 5, 0),
    q(27, PS, MultipleChoice, "Which pair sums to 47?",
      &["19 & 29", "23 & 24", "21 & 28", "25 & 21"], "b", 5, 0),
    q(28, PS, MultipleChoice, "A train covers 90 km in 1h 30m. Its average speed is ____ km/h.",
      &["45", "60", "75", "120"], "b", 5, 0),
    q(29, PS, MultipleChoice, "Unscramble the letters N O L O D N to form a city.",
      &["LONDON", "NODLON", "LONOND", "ONDLON"], "a", 5, 0),
    q(30, PS, MultipleChoice, "Exactly 15 days after Thursday is _____.",
      &["Friday", "Saturday", "Sunday", "Monday"], "a", 5, 0),

    // Attention & focus
    q(31, AF, MultipleChoice, "Count the letter 'F' in: 'Finished files are the result of years of scientific study combined with the experience of years.'",
      &["3", "4", "6", "7"], "c", 15, 0),
    q(32, AF, MultipleChoice, "In 'A B A C B C A B C', how many times does the pattern 'A B' occur?",
      &["2", "3", "4", "5"], "a", 10, 0),
    q(33, AF, MultipleChoice, "What is the middle letter of 'G A T E W A Y'?",
      &["A", "E", "T", "W"], "d", 5, 0),
    q(34, AF, MultipleChoice, "Which numbers in 12, 15, 18, 20, 30 are divisible by both 3 and 5?",
      &["15 only", "30 only", "15 and 30", "None"], "c", 10, 0),
    q(35, AF, MultipleChoice, "After seeing the colors 'red, blue, green, yellow, red, green, blue, red', which color appeared most?",
      &["Red", "Blue", "Green", "Yellow"], "a", 10, 0),
    q(36, AF, MultipleChoice, "Identify the odd symbol: ♣ ♣ ♠ ♣ ♣",
      &["1st", "2nd", "3rd", "4th"], "c", 5, 0),
    q(37, AF, MultipleChoice, "In the grid, how many 7s are there? 7247 | 5767 | 1378 | 9027",
      &["5", "6", "7", "8"], "b", 10, 0),
    q(38, AF, MultipleChoice, "If you read 25 pages in 10 minutes, how many pages will you read in 26 minutes at the same speed?",
      &["52", "60", "65", "75"], "c", 10, 0),
    q(39, AF, MultipleChoice, "Spot the repeated word in 'She decided to to walk home.'",
      &["She", "decided", "to", "home"], "c", 5, 0),
    q(40, AF, MultipleChoice, "Fill the missing number so each row totals 22: 8 3 11 | 6 5 11 | 4 ? 11",
      &["6", "7", "8", "11"], "b", 10, 0),

    // Emotional regulation
    q(41, ER, MultipleChoice, "A colleague criticises you publicly. Your best initial response is to _____.",
      &["Defend your work on the spot", "Stay calm, thank them, and ask to discuss later", "Ignore the comment", "Complain to the manager"], "b", 30, 0),
    q(42, ER, MultipleChoice, "Your project misses its deadline. What do you do first?",
      &["Analyse and share reasons with the team", "Find someone to blame", "Stay silent", "Promise weekend work without a plan"], "a", 30, 0),
    q(43, ER, MultipleChoice, "When overwhelmed, which coping strategy is most effective?",
      &["Take a brief break to reset", "Vent to co-workers", "Push through with declining quality", "Scroll social media"], "a", 30, 0),
    q(44, ER, MultipleChoice, "A teammate harshly attacks your idea. To maintain collaboration, you should _____.",
      &["Calmly explain your reasoning and invite their input", "Attack their ideas in return", "Avoid them", "Report them immediately"], "a", 30, 0),
    q(45, ER, MultipleChoice, "You made a mistake that impacts a client. The best action is to _____.",
      &["Inform, apologise, and present a fix", "Hide the error", "Wait—it may resolve itself", "Blame external factors"], "a", 30, 0),
    q(46, ER, MultipleChoice, "During a tense negotiation you feel anger rising. You should _____.",
      &["Pause and suggest a short break", "Raise your voice", "Accept any terms to end it", "Walk out"], "a", 30, 0),
    q(47, ER, MultipleChoice, "Manager adds urgent work when you're at capacity. You should _____.",
      &["Negotiate priorities or resources", "Agree immediately", "Refuse outright", "Complain to peers only"], "a", 30, 0),
    q(48, ER, MultipleChoice, "A close colleague is under-performing. You should _____.",
      &["Offer private support and ask how to help", "Publicly highlight mistakes", "Ignore it", "Report them with no warning"], "a", 30, 0),
    q(49, ER, MultipleChoice, "Pre-presentation anxiety: the MOST effective quick fix is _____.",
      &["Two-minute deep-breathing", "Large coffee", "Rewrite slides last minute", "Cancel the talk"], "a", 30, 0),
    q(50, ER, MultipleChoice, "After a heated argument, the best way to restore relations is _____.",
      &["Hold a follow-up talk to clarify and plan next steps", "Pretend it never happened", "Avoid future work together", "E-mail proving you were right"], "a", 30, 0),
  ]
}
