//! QES AP: qualified electronic signature. Nothing in it is readable without a PIN.

use std::rc::Rc;

use crate::ap::open;
use crate::transport::CardTransport;
use crate::Card;

pub const AID: [u8; 6] = [0xD2, 0x76, 0x00, 0x00, 0x66, 0x01];

pub struct QesAp<T>
where
    T: CardTransport,
{
    card: Rc<Card<T>>,
}

impl<T> QesAp<T>
where
    T: CardTransport,
{
    open!("QES", AID);

    /// The card this AP was selected on, for commands beyond plain selection.
    pub fn card(&self) -> &Card<T> {
        &self.card
    }
}
