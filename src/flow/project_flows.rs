//! Project conversation, parameterized by the project in focus

use super::id::FlowId;
use super::registry::{ChatOption, FlowNode, Registry, RegistryError, RegistryKind};
use crate::project::ProjectContext;

const BACK_TO_PROJECT_MENU: &str = "Back to project menu";

/// Build the registry used while `project` is in focus.
pub fn build_project_registry(project: &ProjectContext) -> Result<Registry, RegistryError> {
    let title = project.title.as_str();
    let category = title_case(&project.category);
    let year = project.year;

    let tag_list = project
        .tags
        .iter()
        .map(|tag| format!("• `{tag}`"))
        .collect::<Vec<_>>()
        .join("\n");
    let lead_tag = project.tags.first().map_or("the core stack", String::as_str);

    Registry::new(
        RegistryKind::Project,
        [
            FlowNode::new(FlowId::Welcome)
                .message(format!("Let's talk about *{title}*! 🎨"))
                .message(format!("{}\n\n*{category}* · {year}", project.description))
                .message(format!("What would you like to know about {title}?"))
                .with_options(project_menu()),
            FlowNode::new(FlowId::ProjectWelcome)
                .message(format!("*{title}: Project Menu*\nPick a topic to explore."))
                .with_options(project_menu()),
            FlowNode::new(FlowId::Overview)
                .message(format!(
                    "*{category} Overview*\n{title} started in {year} with a simple question: \
                     what would it take to make this feel effortless?"
                ))
                .message(project.description.clone())
                .option("Development process", FlowId::Process)
                .option("Technologies", FlowId::Technologies)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome),
            FlowNode::new(FlowId::Process)
                .message(format!(
                    "*Development Process*\nHere's how *{title}* went from idea to launch:\n\
                     1. Planning & Research\n\
                     2. Design\n\
                     3. Implementation\n\
                     4. Testing & Launch"
                ))
                .message("Pick a phase to dig into.")
                .option("Planning & Research", FlowId::Planning)
                .option("Design", FlowId::DesignPhase)
                .option("Implementation", FlowId::Implementation)
                .option("Testing & Launch", FlowId::Launch)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome),
            FlowNode::new(FlowId::Planning)
                .message(format!(
                    "*Planning & Research*\nEvery {} project starts with the people using it. \
                     For {title} that meant interviews, sketches and a one-page brief.",
                    project.category
                ))
                .option("Next: Design", FlowId::DesignPhase)
                .option("Back to process", FlowId::Process)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome),
            FlowNode::new(FlowId::DesignPhase)
                .message(format!(
                    "*Design*\nPaper prototypes first, then clickable mockups. \
                     The visual language of {title} went through three rounds of feedback."
                ))
                .option("Next: Implementation", FlowId::Implementation)
                .option("Back to process", FlowId::Process)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome),
            FlowNode::new(FlowId::Implementation)
                .message(format!(
                    "*Implementation*\nBuilt primarily with `{lead_tag}`, in two-week iterations \
                     with a playable build at the end of each one."
                ))
                .option("Next: Testing & Launch", FlowId::Launch)
                .option("Back to process", FlowId::Process)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome),
            FlowNode::new(FlowId::Launch)
                .message(format!(
                    "*Testing & Launch*\n{title} shipped in {year} after a month of testing with real users."
                ))
                .option("What came of it?", FlowId::Outcome)
                .option("Back to process", FlowId::Process)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome),
            FlowNode::new(FlowId::Technologies)
                .message(format!("*Technologies*\n{title} is built with:\n{tag_list}"))
                .option("Challenges", FlowId::Challenges)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::Challenges)
                .message(format!(
                    "*Challenges*\nThe hardest part of {title} was keeping it responsive \
                     while everything happens at once."
                ))
                .message("The fix was to make every timed step cancellable and never trust a stale callback.")
                .option("Outcome", FlowId::Outcome)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome),
            FlowNode::new(FlowId::Outcome)
                .message(format!(
                    "*Outcome*\n{title} is still in use today and became the template for later {} work.",
                    project.category
                ))
                .option("See the gallery", FlowId::Gallery)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::Gallery)
                .message(format!("Here's {title} in action."))
                .media(project.image_url.clone())
                .option("Overview", FlowId::Overview)
                .option(BACK_TO_PROJECT_MENU, FlowId::ProjectWelcome)
                .with_option(ChatOption::back_to_main()),
        ],
    )
}

fn project_menu() -> Vec<ChatOption> {
    vec![
        ChatOption::new("Overview", FlowId::Overview),
        ChatOption::new("Development process", FlowId::Process),
        ChatOption::new("Technologies", FlowId::Technologies),
        ChatOption::new("Challenges", FlowId::Challenges),
        ChatOption::new("Outcome", FlowId::Outcome),
        ChatOption::new("Gallery", FlowId::Gallery),
        ChatOption::back_to_main(),
    ]
}

/// Upper-case the first letter of every whitespace-separated word
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
