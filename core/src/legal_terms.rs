/// Built-in legal dictionary: (term, plain-language definition).
pub const DEFAULT_TERMS: &[(&str, &str)] = &[
    ("affidavit", "A written statement someone swears is true, used as evidence"),
    ("allegation", "A claim that someone did something wrong, not yet proven"),
    ("appellant", "The side that asks a higher court to change a decision"),
    ("arbitration", "Settling a dispute with a neutral decision-maker instead of a court"),
    ("bailiff", "A court officer who keeps order in the courtroom"),
    ("breach", "Breaking a rule, duty or promise in an agreement"),
    ("certiorari", "An order by which a higher court reviews a lower court's decision"),
    ("consideration", "Something of value each side gives to make a contract binding"),
    ("covenant", "A formal promise made in a contract"),
    ("damages", "Money paid to make up for a loss or injury"),
    ("defendant", "The person or company being sued or accused"),
    ("deposition", "Sworn testimony given outside court before a trial"),
    ("estoppel", "A rule that stops someone from going back on what they said or did before"),
    ("fiduciary", "Someone trusted to act in another person's best interest"),
    ("force majeure", "Events nobody can control, like disasters, that excuse a party from performing"),
    ("garnishment", "Taking money from someone's wages or account to pay a debt"),
    ("hearsay", "Second-hand information that cannot be directly confirmed"),
    ("indemnification", "Protection against a loss or cost, usually by the other side paying for it"),
    ("indemnify", "To pay someone back for harm or loss"),
    ("injunction", "A court order telling someone to do or stop doing something"),
    ("intestate", "Dying without a valid will"),
    ("jurisdiction", "The authority of a court or government to make legal decisions"),
    ("jurisprudence", "The theory and study of law"),
    ("liability", "Legal responsibility, especially for a debt or damage"),
    ("lien", "A right to hold someone's property until a debt is paid"),
    ("litigation", "Taking a dispute to court"),
    ("malfeasance", "Wrongdoing, especially by a public official"),
    ("negligence", "Failing to take the care a reasonable person would take"),
    ("notary", "An official who witnesses signatures and certifies documents"),
    ("ordinance", "A law made by a city or local government"),
    ("perjury", "Lying in court after promising to tell the truth"),
    ("plaintiff", "The person or company that starts a lawsuit"),
    ("precedent", "An earlier court decision used as a guide for later cases"),
    ("probate", "The legal process of proving a will and handing out an estate"),
    ("remedy", "The way a court fixes a wrong, such as money or an order"),
    ("statute", "A written law passed by a legislature"),
    ("subpoena", "An order requiring someone to come to court or hand over documents"),
    ("testator", "A person who has made a will"),
    ("tort", "A wrongful act, other than breaking a contract, that causes harm"),
    ("venue", "The place where a case is heard"),
    ("warranty", "A promise that something is as described, often with a fix if it is not"),
];
