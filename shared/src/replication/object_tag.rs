/// What an entry in an update packet's object sections describes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObjectAction {
    EndOfSection,
    Diff,
    Snapshot,
    Delete,
    Create,
    CreateAndDelete,
}

impl ObjectAction {
    fn to_bits(self) -> u8 {
        match self {
            ObjectAction::EndOfSection => 0,
            ObjectAction::Diff => 1,
            ObjectAction::Snapshot => 2,
            ObjectAction::Delete => 3,
            ObjectAction::Create => 4,
            ObjectAction::CreateAndDelete => 5,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(ObjectAction::EndOfSection),
            1 => Some(ObjectAction::Diff),
            2 => Some(ObjectAction::Snapshot),
            3 => Some(ObjectAction::Delete),
            4 => Some(ObjectAction::Create),
            5 => Some(ObjectAction::CreateAndDelete),
            _ => None,
        }
    }
}

const ACTION_MASK: u8 = 0b0000_0111;
const BIRTH_BIT: u8 = 0b0000_1000;
const DEATH_BIT: u8 = 0b0001_0000;
const METADATA_BIT: u8 = 0b0010_0000;

/// Single byte tag in front of every object entry.
///
/// `birth` distinguishes a true creation from an object re-entering the
/// receiver's scope, `death` distinguishes destruction from merely leaving it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjectTag {
    pub action: ObjectAction,
    pub birth: bool,
    pub death: bool,
    pub has_metadata: bool,
}

impl ObjectTag {
    pub fn new(action: ObjectAction) -> Self {
        Self {
            action,
            birth: false,
            death: false,
            has_metadata: false,
        }
    }

    pub fn end_of_section() -> Self {
        Self::new(ObjectAction::EndOfSection)
    }

    pub fn with_birth(mut self, birth: bool) -> Self {
        self.birth = birth;
        self
    }

    pub fn with_death(mut self, death: bool) -> Self {
        self.death = death;
        self
    }

    pub fn with_metadata(mut self, has_metadata: bool) -> Self {
        self.has_metadata = has_metadata;
        self
    }

    pub fn to_byte(&self) -> u8 {
        let mut byte = self.action.to_bits();
        if self.birth {
            byte |= BIRTH_BIT;
        }
        if self.death {
            byte |= DEATH_BIT;
        }
        if self.has_metadata {
            byte |= METADATA_BIT;
        }
        byte
    }

    /// Returns `None` for bytes carrying an unknown action or unused bits
    pub fn from_byte(byte: u8) -> Option<Self> {
        if byte & !(ACTION_MASK | BIRTH_BIT | DEATH_BIT | METADATA_BIT) != 0 {
            return None;
        }
        let action = ObjectAction::from_bits(byte & ACTION_MASK)?;
        Some(Self {
            action,
            birth: byte & BIRTH_BIT != 0,
            death: byte & DEATH_BIT != 0,
            has_metadata: byte & METADATA_BIT != 0,
        })
    }
}
