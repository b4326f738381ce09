// Session State
// Draft and mirrored agent values owned by the toolbar session

use indexmap::IndexMap;
use pinpoint_protocol::{
  AgentAvailability, AgentEvent, AgentInfo, AgentState, SelectedDoc, UserMessageContentItem,
};

use crate::context::{BlockStub, ContextSelection, DomContextEntry, PageInfo, ThemeStub};

/// The message being composed. Every mutator returns whether it changed
/// anything so it can drive `watch::Sender::send_if_modified`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
  pub input: String,
  pub dom_context: Vec<DomContextEntry>,
  pub docs: Vec<SelectedDoc>,
  pub blocks: Vec<BlockStub>,
  pub themes: Vec<ThemeStub>,
}

impl Draft {
  pub fn set_input(&mut self, input: &str) -> bool {
    if self.input == input {
      return false;
    }
    input.clone_into(&mut self.input);
    true
  }

  /// Elements are keyed by XPath; selecting the same element twice is a no-op.
  pub fn add_dom_context(&mut self, entry: DomContextEntry) -> bool {
    if self
      .dom_context
      .iter()
      .any(|e| e.element.xpath == entry.element.xpath)
    {
      return false;
    }
    self.dom_context.push(entry);
    true
  }

  pub fn remove_dom_context(&mut self, xpath: &str) -> bool {
    remove_where(&mut self.dom_context, |e| e.element.xpath == xpath)
  }

  pub fn add_doc(&mut self, doc: SelectedDoc) -> bool {
    if self.docs.iter().any(|d| d.id == doc.id) {
      return false;
    }
    self.docs.push(doc);
    true
  }

  pub fn remove_doc(&mut self, id: &str) -> bool {
    remove_where(&mut self.docs, |d| d.id == id)
  }

  pub fn add_block(&mut self, block: BlockStub) -> bool {
    if self.blocks.iter().any(|b| b.name == block.name) {
      return false;
    }
    self.blocks.push(block);
    true
  }

  pub fn remove_block(&mut self, name: &str) -> bool {
    remove_where(&mut self.blocks, |b| b.name == name)
  }

  pub fn add_theme(&mut self, theme: ThemeStub) -> bool {
    if self.themes.iter().any(|t| t.name == theme.name) {
      return false;
    }
    self.themes.push(theme);
    true
  }

  pub fn remove_theme(&mut self, name: &str) -> bool {
    remove_where(&mut self.themes, |t| t.name == name)
  }

  pub fn clear(&mut self) -> bool {
    if *self == Draft::default() {
      return false;
    }
    *self = Draft::default();
    true
  }

  pub fn selection(&self, page: PageInfo) -> ContextSelection {
    ContextSelection {
      page,
      elements: self.dom_context.clone(),
      docs: self.docs.clone(),
      blocks: self.blocks.clone(),
      themes: self.themes.clone(),
    }
  }
}

fn remove_where<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
  let before = items.len();
  items.retain(|item| !matches(item));
  items.len() != before
}

/// Agent messages kept by [`AgentMirror`]; the oldest is dropped beyond this.
pub const MAX_AGENT_MESSAGES: usize = 100;

/// The toolbar's copy of the agent's published state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMirror {
  pub state: AgentState,
  pub availability: AgentAvailability,
  pub info: Option<AgentInfo>,
  /// Latest agent-authored messages by id, in arrival order.
  pub messages: IndexMap<String, Vec<UserMessageContentItem>>,
}

impl AgentMirror {
  pub fn apply(&mut self, event: AgentEvent) {
    match event {
      AgentEvent::StateChanged(state) => self.state = state,
      AgentEvent::AvailabilityChanged(availability) => self.availability = availability,
      AgentEvent::InfoChanged(info) => self.info = Some(info),
      AgentEvent::AgentMessage(update) => {
        let content = self.messages.entry(update.message_id).or_default();
        if update.resync {
          content.clear();
        }
        content.extend(update.content_items);
        while self.messages.len() > MAX_AGENT_MESSAGES {
          self.messages.shift_remove_index(0);
        }
      }
    }
  }

  /// Connected and in a phase that takes new prompts.
  pub fn accepts_input(&self) -> bool {
    self.availability.is_available && self.state.state.accepts_user_input()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pinpoint_protocol::{AgentMessageUpdate, AgentStateType, ContextCategory, SelectedElement};
  use pretty_assertions::assert_eq;

  fn doc(id: &str) -> SelectedDoc {
    SelectedDoc {
      id: id.to_string(),
      title: id.to_string(),
      description: String::new(),
      category: ContextCategory::Recent,
      content: None,
    }
  }

  #[test]
  fn docs_are_deduplicated_by_id() {
    let mut draft = Draft::default();
    assert!(draft.add_doc(doc("/tailwind")));
    assert!(!draft.add_doc(doc("/tailwind")));
    assert!(draft.add_doc(doc("/react")));
    assert!(draft.remove_doc("/tailwind"));
    assert!(!draft.remove_doc("/tailwind"));
    assert_eq!(draft.docs, vec![doc("/react")]);
  }

  #[test]
  fn elements_are_removed_by_xpath() {
    let mut draft = Draft::default();
    let entry = |xpath: &str| DomContextEntry {
      element: SelectedElement::new("div", xpath),
      plugin_annotations: Vec::new(),
    };
    assert!(draft.add_dom_context(entry("/html/body/div[1]")));
    assert!(!draft.add_dom_context(entry("/html/body/div[1]")));
    assert!(draft.add_dom_context(entry("/html/body/div[2]")));
    assert!(draft.remove_dom_context("/html/body/div[1]"));
    assert_eq!(draft.dom_context.len(), 1);
  }

  #[test]
  fn clear_resets_everything() {
    let mut draft = Draft::default();
    draft.set_input("hello");
    draft.add_theme(ThemeStub {
      name: "sunset".to_string(),
    });
    assert!(draft.clear());
    assert!(!draft.clear());
    assert_eq!(draft, Draft::default());
  }

  #[test]
  fn agent_messages_append_or_resync() {
    let mut mirror = AgentMirror::default();
    let update = |text: &str, resync| {
      AgentEvent::AgentMessage(AgentMessageUpdate {
        message_id: "m1".to_string(),
        content_items: vec![UserMessageContentItem::text(text)],
        resync,
      })
    };
    mirror.apply(update("a", false));
    mirror.apply(update("b", false));
    assert_eq!(mirror.messages["m1"].len(), 2);
    mirror.apply(update("c", true));
    assert_eq!(mirror.messages["m1"], vec![UserMessageContentItem::text("c")]);
  }

  #[test]
  fn agent_messages_keep_only_the_latest() {
    let mut mirror = AgentMirror::default();
    for n in 0..=MAX_AGENT_MESSAGES {
      mirror.apply(AgentEvent::AgentMessage(AgentMessageUpdate {
        message_id: format!("m{n}"),
        content_items: vec![UserMessageContentItem::text("part")],
        resync: false,
      }));
    }

    assert_eq!(mirror.messages.len(), MAX_AGENT_MESSAGES);
    assert!(!mirror.messages.contains_key("m0"));
    assert_eq!(mirror.messages.get_index(0).map(|(id, _)| id.as_str()), Some("m1"));
    let last = format!("m{MAX_AGENT_MESSAGES}");
    assert!(mirror.messages.contains_key(&last));
  }

  #[test]
  fn input_requires_connection_and_resting_phase() {
    let mut mirror = AgentMirror::default();
    assert!(!mirror.accepts_input());
    mirror.apply(AgentEvent::AvailabilityChanged(AgentAvailability::available()));
    assert!(mirror.accepts_input());
    mirror.apply(AgentEvent::StateChanged(AgentState::new(AgentStateType::Working, None)));
    assert!(!mirror.accepts_input());
    mirror.apply(AgentEvent::StateChanged(AgentState::new(
      AgentStateType::WaitingForUserResponse,
      None,
    )));
    assert!(mirror.accepts_input());
  }
}
