//! Default conversation: work history, projects and skills

use super::id::FlowId;
use super::registry::{ChatOption, FlowNode, Registry, RegistryError, RegistryKind};

/// Build the registry used when no project is in focus.
pub fn default_registry(author: &str) -> Result<Registry, RegistryError> {
    Registry::new(
        RegistryKind::Default,
        [
            FlowNode::new(FlowId::Welcome)
                .message(format!(
                    "Hi there! 👋 I'm the portfolio assistant for *{author}*."
                ))
                .message(format!(
                    "I can walk you through {author}'s work history, projects and skills. What would you like to know?"
                ))
                .option("Who are you?", FlowId::About)
                .option("Work experience", FlowId::Experience)
                .option("Projects", FlowId::Projects)
                .option("Skills", FlowId::Skills)
                .option("Get in touch", FlowId::Contact),
            FlowNode::new(FlowId::About)
                .message(format!(
                    "{author} is a software engineer who likes building things people can touch: \
                     interactive installations, small games and tools for everyday life."
                ))
                .message(
                    "Most days that means *Rust* on the backend, TypeScript on the frontend, \
                     and the occasional microcontroller in between.",
                )
                .option("Work experience", FlowId::Experience)
                .option("Projects", FlowId::Projects)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::Experience)
                .message(
                    "*Work Experience*\n\
                     • *Senior Software Engineer* at Northwind Labs (2021 to present)\n\
                     • *Software Engineer* at Brightline Studio (2018 to 2021)\n\
                     • *Junior Developer* at Pixel Forge (2016 to 2018)",
                )
                .message("Which role would you like to hear more about?")
                .option("Northwind Labs", FlowId::CurrentRole)
                .option("Earlier roles", FlowId::EarlierRoles)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::CurrentRole)
                .message(
                    "At *Northwind Labs* the focus is the event ingestion platform:\n\
                     • Rewrote the ingestion service in Rust, cutting p99 latency by 60%\n\
                     • Designed the `schema-registry` used by twelve teams\n\
                     • Mentors two junior engineers",
                )
                .option("Earlier roles", FlowId::EarlierRoles)
                .option("Projects", FlowId::Projects)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::EarlierRoles)
                .message(
                    "At *Brightline Studio* the work was interactive museum exhibits, \
                     from sensor wiring to the content management tools.",
                )
                .message(
                    "Before that, *Pixel Forge* was the first job out of school: \
                     web shops, landing pages and a lot of learning.",
                )
                .option("Northwind Labs", FlowId::CurrentRole)
                .option("Skills", FlowId::Skills)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::Skills)
                .message(
                    "*Core Skills*\n\
                     1. Systems programming with `Rust` and `C`\n\
                     2. Web services with `axum`, `PostgreSQL` and `Redis`\n\
                     3. Frontends with `TypeScript` and `React`\n\
                     4. Real-time graphics with `Unity` and `Bevy`",
                )
                .option("See projects", FlowId::Projects)
                .option("Get in touch", FlowId::Contact)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::Projects)
                .message(
                    "A few highlights from the gallery:\n\
                     • *PL@Y2*: an interactive playground installation\n\
                     • *Ledgerly*: shared household budgeting\n\
                     • *Driftwood*: a procedural sailing game",
                )
                .message("Pick a project in the gallery to chat about it in detail, or keep browsing here.")
                .option("Featured work", FlowId::FeaturedWork)
                .option("Read the blog", FlowId::Blog)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::FeaturedWork)
                .message("Here are two screens from *Ledgerly*:\n[IMAGE:ledgerly-dashboard.png][IMAGE:ledgerly-mobile.png]")
                .message("And the *PL@Y2* installation on opening night.")
                .media("play2-opening.jpg")
                .option("Back to projects", FlowId::Projects)
                .option("Get in touch", FlowId::Contact)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::Blog)
                .message(
                    "The blog covers build logs and lessons learned: https://blog.example.dev\n\
                     Latest post: *Timers, cancellation and chatbots that don't talk over themselves*.",
                )
                .option("Back to projects", FlowId::Projects)
                .with_option(ChatOption::back_to_main()),
            FlowNode::new(FlowId::Contact)
                .message(
                    "You can reach out any time:\n\
                     • Email: hello@example.dev\n\
                     • GitHub: https://github.com/example\n\
                     • LinkedIn: https://www.linkedin.com/in/example",
                )
                .option("Who are you?", FlowId::About)
                .with_option(ChatOption::back_to_main()),
        ],
    )
}
